use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use wasm_run::{
    config::{Config, ImportStrategy},
    host::builtins,
    session,
};

#[derive(Debug, Parser)]
#[clap(author, about, version)]
struct Args {
    /// Trace loading, linking and execution.
    #[arg(short)]
    verbose: bool,

    /// Validate the module before running it.
    #[arg(long = "verify-module")]
    verify: bool,

    /// Where imported modules come from.
    #[arg(long, value_enum, default_value_t = ImportStrategy::InProcess)]
    imports: ImportStrategy,

    /// Directory searched for `<module>.wasm` by the file strategy.
    #[arg(long, default_value = ".")]
    import_dir: PathBuf,

    file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    if args.verbose {
        logger.filter_level(LevelFilter::Trace);
    } else if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    } else {
        logger.filter_level(LevelFilter::Warn);
    }
    logger.init();

    let config = Config {
        verbose: args.verbose,
        verify: args.verify,
        strategy: args.imports,
        import_dir: args.import_dir,
    };

    let report = session::run(&args.file, &config, builtins::registry()?)?;
    for outcome in report.outcomes.iter().filter(|outcome| !outcome.is_skipped()) {
        println!("{outcome}");
    }
    println!("{}", report.summary());
    Ok(())
}
