use crate::{
    binary::{
        module::{Decoder, FuncInst, Module},
        types::{Export, ExportDesc},
        validate::{Validator, WasmValidator},
    },
    error::Error,
    host::Registry,
};
use anyhow::Result;
use log::debug;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Extension appended to an import module name by the file strategy.
pub const MODULE_EXTENSION: &str = "wasm";

/// Produces the module a loading module imports from.
pub trait Importer {
    fn import(&self, name: &str) -> Result<Module>;
}

/// Imported modules of one module, by name.
#[derive(Debug, Default, Clone)]
pub struct Imports(BTreeMap<String, Rc<Module>>);

impl Imports {
    pub fn get(&self, name: &str) -> Option<Rc<Module>> {
        self.0.get(name).map(Rc::clone)
    }

    pub fn add(&mut self, name: &str, module: Rc<Module>) {
        self.0.insert(name.into(), module);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<Module>)> {
        self.0.iter().map(|(name, module)| (name.as_str(), module))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serves every import module name with a synthetic module built from the
/// host function registry.
#[derive(Debug)]
pub struct InProcessImporter {
    registry: Registry,
}

impl InProcessImporter {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Importer for InProcessImporter {
    fn import(&self, name: &str) -> Result<Module> {
        println!("import name: {name}");

        let mut types = vec![];
        let mut funcs = vec![];
        let mut exports = vec![];

        for (idx, func) in self.registry.iter().enumerate() {
            types.push(Some(func.signature.clone()));
            funcs.push(FuncInst::Host {
                import: None,
                func: func.clone(),
            });
            exports.push(Export {
                name: func.name.clone(),
                desc: ExportDesc::Func(idx as u32),
            });
        }

        let module = Module {
            name: name.to_string(),
            types,
            funcs,
            export_section: Some(exports),
            ..Module::default()
        };
        Ok(module)
    }
}

/// Serves an import module name from `<dir>/<name>.wasm`.
#[derive(Debug)]
pub struct FileImporter {
    dir: PathBuf,
    verbose: bool,
}

impl FileImporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODULE_EXTENSION}"))
    }

    fn load(&self, path: &Path) -> Result<Module> {
        let module = Decoder::from_file(path)?.verbose(self.verbose).decode(None)?;
        WasmValidator::new().verbose(self.verbose).verify(&module)?;
        Ok(module)
    }
}

impl Importer for FileImporter {
    fn import(&self, name: &str) -> Result<Module> {
        let path = self.path_of(name);
        debug!("import module '{name}' from {}", path.display());
        self.load(&path).map_err(|source| {
            Error::ImportResolution {
                module: name.to_string(),
                source,
            }
            .into()
        })
    }
}

#[cfg(test)]
mod test {
    use super::{FileImporter, Importer, InProcessImporter};
    use crate::{
        binary::types::ExportDesc,
        error::Error,
        host::builtins,
    };
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::{fs, path::Path};

    fn describe(module: &crate::binary::module::Module) -> Result<Vec<(String, String)>> {
        let mut entries = vec![];
        for export in module.export_section.iter().flatten() {
            let ExportDesc::Func(idx) = export.desc else {
                continue;
            };
            entries.push((export.name.clone(), module.func_type(idx)?.to_string()));
        }
        Ok(entries)
    }

    #[test]
    fn synthesize_host_module() -> Result<()> {
        let importer = InProcessImporter::new(builtins::registry()?);
        let module = importer.import("env")?;

        assert_eq!(module.name, "env");
        assert!(module.bytes.is_none());
        assert_eq!(
            describe(&module)?,
            vec![
                ("add3".to_string(), "(i32) -> (i32)".to_string()),
                ("add5".to_string(), "(i32) -> (i32)".to_string()),
                ("Println".to_string(), "(i32) -> ()".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn import_is_idempotent() -> Result<()> {
        let importer = InProcessImporter::new(builtins::registry()?);
        let first = importer.import("env")?;
        let second = importer.import("env")?;
        assert_eq!(describe(&first)?, describe(&second)?);
        assert_eq!(first.types, second.types);
        assert_eq!(first.export_section, second.export_section);
        Ok(())
    }

    #[test]
    fn load_module_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let wasm = wat::parse_str(r#"(module (func (export "seven") (result i32) (i32.const 7)))"#)?;
        fs::write(dir.path().join("lib.wasm"), wasm)?;

        let importer = FileImporter::new(dir.path());
        let module = importer.import("lib")?;
        assert_eq!(module.name, "lib");
        assert_eq!(
            describe(&module)?,
            vec![("seven".to_string(), "() -> (i32)".to_string())]
        );
        Ok(())
    }

    fn assert_resolution_error(dir: &Path, name: &str) {
        let err = FileImporter::new(dir).import(name).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ImportResolution { module, .. }) if module == name
        ));
    }

    #[test]
    fn missing_file_is_resolution_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_resolution_error(dir.path(), "nope");
        Ok(())
    }

    #[test]
    fn undecodable_file_is_resolution_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("garbage.wasm"), b"not a wasm module")?;
        assert_resolution_error(dir.path(), "garbage");
        Ok(())
    }

    #[test]
    fn invalid_module_is_resolution_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // decodes, but the body leaves an i64 where an i32 is expected
        let wasm = wat::parse_str(r#"(module (func (export "f") (result i32) (i64.const 1)))"#)?;
        fs::write(dir.path().join("invalid.wasm"), wasm)?;
        assert_resolution_error(dir.path(), "invalid");
        Ok(())
    }

    #[test]
    fn imported_modules_must_not_import() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let wasm = wat::parse_str(r#"(module (import "env" "add3" (func (param i32) (result i32))))"#)?;
        fs::write(dir.path().join("nested.wasm"), wasm)?;
        assert_resolution_error(dir.path(), "nested");
        Ok(())
    }
}
