use super::{module::Module, types::ExportDesc};
use anyhow::{Context as _, Result};
use log::debug;

pub trait Validator {
    fn verify(&self, module: &Module) -> Result<()>;
}

/// Checks modules with `wasmparser`'s validator. Synthetic modules have no
/// binary, so only their export table and function index space are checked
/// for dangling indices.
#[derive(Debug, Default)]
pub struct WasmValidator {
    verbose: bool,
}

impl WasmValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Validator for WasmValidator {
    fn verify(&self, module: &Module) -> Result<()> {
        if let Some(ref bytes) = module.bytes {
            wasmparser::Validator::new()
                .validate_all(bytes)
                .with_context(|| format!("module '{}' is invalid", module.name))?;
            if self.verbose {
                debug!("{}: validated {} bytes", module.name, bytes.len());
            }
            return Ok(());
        }

        for export in module.export_section.iter().flatten() {
            if let ExportDesc::Func(idx) = export.desc {
                module.func_type(idx).with_context(|| {
                    format!("export '{}' of module '{}' is invalid", export.name, module.name)
                })?;
            }
        }
        for idx in 0..module.funcs.len() as u32 {
            module.func_type(idx).with_context(|| {
                format!("function {idx} of module '{}' has no type", module.name)
            })?;
        }
        Ok(())
    }
}
