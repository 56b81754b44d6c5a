use super::types::*;
use crate::{
    error::Error,
    execution::importer::{Importer, Imports},
    host::HostFunction,
};
use anyhow::{bail, Context as _, Result};
use log::{debug, trace, warn};
use std::{
    fs,
    io::{self, BufReader, Read},
    path::Path,
    rc::Rc,
};
use wasmparser::{Parser, Payload, TypeRef};

/// An entry of the function index space.
#[derive(Debug, Clone)]
pub enum FuncInst {
    /// A function with bytecode in this module.
    Internal { type_idx: u32 },
    /// A native function. `import` is the slot it was bound to, absent for
    /// the functions of a synthetic host module.
    Host {
        import: Option<ImportRef>,
        func: HostFunction,
    },
    /// A function of an on-disk module, typed by this module's type table.
    External { import: ImportRef, type_idx: u32 },
}

#[derive(Debug, Default)]
pub struct Module {
    pub name: String,
    /// The binary this module was decoded from, absent for synthetic modules.
    pub bytes: Option<Vec<u8>>,
    /// The type table. `None` marks a signature using value types other than
    /// i32, i64, f32 and f64.
    pub types: Vec<Option<FuncType>>,
    pub funcs: Vec<FuncInst>,
    pub export_section: Option<Vec<Export>>,
    pub imports: Imports,
}

impl Module {
    pub fn func(&self, idx: u32) -> Result<&FuncInst> {
        let func = self
            .funcs
            .get(idx as usize)
            .ok_or(Error::NotFoundFunction(idx))?;
        Ok(func)
    }

    /// Resolves the signature of a function through the function index space
    /// and the type table.
    pub fn func_type(&self, idx: u32) -> Result<&FuncType> {
        match self.func(idx)? {
            FuncInst::Host { func, .. } => Ok(&func.signature),
            FuncInst::Internal { type_idx } | FuncInst::External { type_idx, .. } => {
                resolve_type(&self.types, *type_idx)
            }
        }
    }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.export_section
            .as_ref()?
            .iter()
            .find(|export| export.name == name)
    }
}

pub struct Decoder<R> {
    reader: BufReader<R>,
    name: String,
    verbose: bool,
}

impl Decoder<fs::File> {
    /// Opens `path` for decoding. The module is named after the file stem.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .with_context(|| format!("could not open module {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file).with_name(name))
    }
}

impl<R: io::Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        let reader = BufReader::new(reader);
        Self {
            reader,
            name: String::new(),
            verbose: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Decodes the module and links its imports. `importer` is asked once
    /// per distinct import module name.
    pub fn decode(&mut self, importer: Option<&dyn Importer>) -> Result<Module> {
        let mut bytes = vec![];
        self.reader.read_to_end(&mut bytes)?;

        let mut types = vec![];
        let mut import_section = vec![];
        let mut function_section = vec![];
        let mut export_section = None;

        for payload in Parser::new(0).parse_all(&bytes) {
            match payload? {
                Payload::TypeSection(reader) => {
                    self.section("type", reader.count());
                    for func_type in reader.into_iter_err_on_gc_types() {
                        match FuncType::try_from(&func_type?) {
                            Ok(func_type) => types.push(Some(func_type)),
                            Err(e) => {
                                debug!("{}: type {}: {e}", self.name, types.len());
                                types.push(None);
                            }
                        }
                    }
                }
                Payload::ImportSection(reader) => {
                    self.section("import", reader.count());
                    for import in reader {
                        let import = import?;
                        import_section.push((ImportRef::new(import.module, import.name), import.ty));
                    }
                }
                Payload::FunctionSection(reader) => {
                    self.section("function", reader.count());
                    for type_idx in reader {
                        function_section.push(type_idx?);
                    }
                }
                Payload::ExportSection(reader) => {
                    self.section("export", reader.count());
                    let mut exports = vec![];
                    for export in reader {
                        let export = export?;
                        match ExportDesc::from_parts(export.kind, export.index) {
                            Some(desc) => exports.push(Export {
                                name: export.name.to_string(),
                                desc,
                            }),
                            None => warn!("skip export '{}' of unsupported kind", export.name),
                        }
                    }
                    export_section = Some(exports);
                }
                _ => {}
            }
        }

        let mut imports = Imports::default();
        let mut funcs = vec![];

        if !import_section.is_empty() {
            let importer = importer
                .with_context(|| "module has import section, but not found any importer")?;

            for (import, ty) in import_section {
                let imported = match imports.get(&import.module) {
                    Some(module) => module,
                    None => {
                        let module = importer
                            .import(&import.module)
                            .with_context(|| format!("could not import module '{}'", import.module))?;
                        let module = Rc::new(module);
                        imports.add(&import.module, Rc::clone(&module));
                        module
                    }
                };

                match ty {
                    TypeRef::Func(type_idx) => {
                        let expected = resolve_type(&types, type_idx)
                            .with_context(|| format!("could not link {import}"))?;
                        let func = link_func(&import, type_idx, expected, &imported)?;
                        funcs.push(func);
                    }
                    TypeRef::Table(_) => link_export(&import, ExternalKind::Table, &imported)?,
                    TypeRef::Memory(_) => link_export(&import, ExternalKind::Memory, &imported)?,
                    TypeRef::Global(_) => link_export(&import, ExternalKind::Global, &imported)?,
                    _ => bail!("unsupported import kind of {import}"),
                }
            }
        }

        for type_idx in function_section {
            funcs.push(FuncInst::Internal { type_idx });
        }

        if let Some(ref exports) = export_section {
            for export in exports {
                if let ExportDesc::Func(idx) = export.desc {
                    if funcs.get(idx as usize).is_none() {
                        bail!(Error::NotFoundFunction(idx));
                    }
                }
            }
        }

        Ok(Module {
            name: self.name.clone(),
            bytes: Some(bytes),
            types,
            funcs,
            export_section,
            imports,
        })
    }

    fn section(&self, name: &str, count: u32) {
        if self.verbose {
            debug!("{}: decode {name} section with {count} entries", self.name);
        } else {
            trace!("decode {name} section");
        }
    }
}

fn resolve_type(types: &[Option<FuncType>], idx: u32) -> Result<&FuncType> {
    match types.get(idx as usize) {
        Some(Some(func_type)) => Ok(func_type),
        Some(None) => bail!(Error::UnsupportedFuncType(idx)),
        None => bail!(Error::NotFoundFuncType(idx)),
    }
}

fn link_func(
    import: &ImportRef,
    type_idx: u32,
    expected: &FuncType,
    imported: &Module,
) -> Result<FuncInst> {
    let idx = match imported.export(&import.field).map(|export| export.desc) {
        Some(ExportDesc::Func(idx)) => idx,
        _ => bail!(Error::UnknownImport {
            module: import.module.clone(),
            field: import.field.clone(),
        }),
    };

    let actual = imported.func_type(idx)?;
    if actual != expected {
        bail!(Error::IncompatibleImportType {
            module: import.module.clone(),
            field: import.field.clone(),
            expected: expected.clone(),
            actual: actual.clone(),
        });
    }

    let func = match imported.func(idx)? {
        FuncInst::Host { func, .. } => FuncInst::Host {
            import: Some(import.clone()),
            func: func.clone(),
        },
        FuncInst::Internal { .. } | FuncInst::External { .. } => FuncInst::External {
            import: import.clone(),
            type_idx,
        },
    };
    trace!("link {import}: {expected}");
    Ok(func)
}

fn link_export(import: &ImportRef, kind: ExternalKind, imported: &Module) -> Result<()> {
    match imported.export(&import.field) {
        Some(export) if export.desc.kind() == kind => {
            trace!("link {import}: {kind}");
            Ok(())
        }
        _ => bail!(Error::UnknownImport {
            module: import.module.clone(),
            field: import.field.clone(),
        }),
    }
}
