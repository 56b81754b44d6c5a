use clap::ValueEnum;
use std::path::PathBuf;

/// How the modules named in an import section are resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportStrategy {
    /// Bind imports to the host function registry.
    #[default]
    InProcess,
    /// Load `<module>.wasm` from the import directory.
    File,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    pub verify: bool,
    pub strategy: ImportStrategy,
    /// Directory searched by the file strategy.
    pub import_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            verify: false,
            strategy: ImportStrategy::default(),
            import_dir: PathBuf::from("."),
        }
    }
}
