use crate::{
    binary::{
        module::Decoder,
        validate::{Validator, WasmValidator},
    },
    config::{Config, ImportStrategy},
    execution::{
        driver::{run_exports, Report},
        engine::{Engine, WasmtimeEngine},
        importer::{FileImporter, Importer, InProcessImporter},
    },
    host::Registry,
};
use anyhow::{Context as _, Result};
use log::{debug, info};
use std::path::Path;

/// Loads the module at `path`, links it, optionally validates it and runs
/// every zero-argument function export. An `Err` means nothing was executed.
pub fn run(path: impl AsRef<Path>, config: &Config, registry: Registry) -> Result<Report> {
    let path = path.as_ref();

    let importer: Box<dyn Importer> = match config.strategy {
        ImportStrategy::InProcess => Box::new(InProcessImporter::new(registry)),
        ImportStrategy::File => {
            Box::new(FileImporter::new(&config.import_dir).verbose(config.verbose))
        }
    };
    debug!("resolve imports with {:?} strategy", config.strategy);

    let module = Decoder::from_file(path)?
        .verbose(config.verbose)
        .decode(Some(importer.as_ref()))
        .context("could not read module")?;

    if config.verify {
        WasmValidator::new()
            .verbose(config.verbose)
            .verify(&module)
            .context("could not verify module")?;
    }

    if module.export_section.is_none() {
        return Err(crate::error::Error::NoExports.into());
    }

    let mut vm = WasmtimeEngine::new(config.verbose)?
        .instantiate(&module)
        .context("could not create VM")?;

    let report = run_exports(&module, &mut vm)?;
    info!("{}: {}", report.module, report.summary());
    Ok(report)
}
