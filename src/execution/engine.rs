use super::value::Value;
use crate::{
    binary::{
        module::{FuncInst, Module},
        types::{ExportDesc, ImportRef},
    },
    error::Error,
    host::HostFunction,
};
use anyhow::{Context as _, Result};
use log::{debug, trace};
use std::collections::HashMap;
use wasmtime::{Linker, Store, Val};

/// A linked module ready to execute functions.
pub trait Vm {
    fn invoke(&mut self, func_idx: u32, args: &[Value]) -> Result<Vec<Value>>;
}

pub trait Engine {
    type Vm: Vm;

    /// Links `module` against its imports. Failing here is fatal for the run.
    fn instantiate(&self, module: &Module) -> Result<Self::Vm>;
}

pub struct WasmtimeEngine {
    engine: wasmtime::Engine,
    verbose: bool,
}

impl WasmtimeEngine {
    pub fn new(verbose: bool) -> Result<Self> {
        let mut config = wasmtime::Config::new();
        config.wasm_backtrace_details(if verbose {
            wasmtime::WasmBacktraceDetails::Enable
        } else {
            wasmtime::WasmBacktraceDetails::Environment
        });
        let engine = wasmtime::Engine::new(&config)?;
        Ok(Self { engine, verbose })
    }

    fn define_host(
        &self,
        linker: &mut Linker<()>,
        import: &ImportRef,
        func: &HostFunction,
    ) -> Result<()> {
        let ty = wasmtime::FuncType::new(
            &self.engine,
            func.signature.params.iter().copied().map(wasmtime::ValType::from),
            func.signature.results.iter().copied().map(wasmtime::ValType::from),
        );
        if self.verbose {
            debug!("define {import} as host function '{}'", func.name);
        }

        let func = func.clone();
        linker.func_new(
            &import.module,
            &import.field,
            ty,
            move |_caller, params, results| {
                let args = params
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?;
                let values = func.call(&args)?;
                for (slot, value) in results.iter_mut().zip(values) {
                    *slot = value.into();
                }
                Ok(())
            },
        )?;
        Ok(())
    }
}

impl Engine for WasmtimeEngine {
    type Vm = WasmtimeVm;

    fn instantiate(&self, module: &Module) -> Result<WasmtimeVm> {
        let bytes = module
            .bytes
            .as_ref()
            .with_context(|| format!("module '{}' has no bytecode to execute", module.name))?;

        let mut store = Store::new(&self.engine, ());
        let mut linker = Linker::new(&self.engine);
        linker.allow_shadowing(true);

        // on-disk imports do not import anything themselves
        for (name, imported) in module.imports.iter() {
            let Some(ref bytes) = imported.bytes else {
                continue;
            };
            if self.verbose {
                debug!("instantiate imported module '{name}'");
            }
            let compiled = wasmtime::Module::new(&self.engine, bytes)
                .with_context(|| format!("could not compile module '{name}'"))?;
            let instance = linker
                .instantiate(&mut store, &compiled)
                .with_context(|| format!("could not instantiate module '{name}'"))?;
            linker.instance(&mut store, name, instance)?;
        }

        for func in module.funcs.iter() {
            if let FuncInst::Host {
                import: Some(import),
                func,
            } = func
            {
                self.define_host(&mut linker, import, func)?;
            }
        }

        let compiled = wasmtime::Module::new(&self.engine, bytes)
            .with_context(|| format!("could not compile module '{}'", module.name))?;
        let instance = linker
            .instantiate(&mut store, &compiled)
            .with_context(|| format!("could not instantiate module '{}'", module.name))?;

        let mut exports = HashMap::new();
        for export in module.export_section.iter().flatten() {
            if let ExportDesc::Func(idx) = export.desc {
                exports.entry(idx).or_insert_with(|| export.name.clone());
            }
        }
        trace!("exported functions: {:?}", &exports);

        Ok(WasmtimeVm {
            store,
            instance,
            exports,
        })
    }
}

pub struct WasmtimeVm {
    store: Store<()>,
    instance: wasmtime::Instance,
    exports: HashMap<u32, String>,
}

impl Vm for WasmtimeVm {
    // wasmtime reaches functions through the export table, so only exported
    // indices can be invoked
    fn invoke(&mut self, func_idx: u32, args: &[Value]) -> Result<Vec<Value>> {
        let name = self
            .exports
            .get(&func_idx)
            .ok_or(Error::NotFoundFunction(func_idx))?;
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .with_context(|| format!("not found exported function by name: {name}"))?;

        let params: Vec<Val> = args.iter().copied().map(Val::from).collect();
        let mut results = vec![Val::I32(0); func.ty(&self.store).results().len()];
        func.call(&mut self.store, &params, &mut results)?;

        results.iter().map(Value::try_from).collect()
    }
}
