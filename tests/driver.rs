use anyhow::Result;
use pretty_assertions::assert_eq;
use std::{
    fs,
    path::{Path, PathBuf},
};
use wasm_run::{
    config::{Config, ImportStrategy},
    error::Error,
    execution::driver::Status,
    host::{builtins, Registry},
    session, Value,
};

fn write_wat(dir: &Path, file: &str, source: &str) -> Result<PathBuf> {
    let path = dir.join(file);
    fs::write(&path, wat::parse_str(source)?)?;
    Ok(path)
}

#[test]
fn run_module_with_host_imports() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(
        dir.path(),
        "calls.wasm",
        r#"
(module
  (import "env" "add3" (func $add3 (param i32) (result i32)))
  (import "env" "add5" (func $add5 (param i32) (result i32)))
  (import "env" "Println" (func $println (param i32)))
  (func (export "callAdd3") (result i32) (call $add3 (i32.const 1)))
  (func (export "callAdd5") (result i32) (call $add5 (i32.const 2)))
  (func (export "callPrintln") (call $println (i32.const 42)))
)
        "#,
    )?;

    let report = session::run(&path, &Config::default(), builtins::registry()?)?;
    assert_eq!(report.module, "calls");
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|outcome| outcome.is_succeeded()));

    let values: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match outcome.status {
            Status::Succeeded(Some((value, _))) => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![Some(Value::I32(4)), Some(Value::I32(7)), None]);
    assert_eq!(report.summary().to_string(), "3 succeeded, 0 failed, 0 skipped");

    Ok(())
}

#[test]
fn skipped_and_failed_exports_do_not_stop_the_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(
        dir.path(),
        "mixed.wasm",
        r#"
(module
  (memory (export "mem") 1)
  (func (export "pair") (result i32 i32) (i32.const 1) (i32.const 2))
  (func (export "takes") (param i32) (result i32) (local.get 0))
  (func (export "trap") (unreachable))
  (func (export "last") (result f32) (f32.const 1.5))
)
        "#,
    )?;

    let report = session::run(&path, &Config::default(), Registry::new())?;
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["pair", "takes", "trap", "last"]);
    assert!(matches!(
        report.outcomes[0].status,
        Status::Skipped(Error::UnsupportedReturnArity(2))
    ));
    assert!(matches!(
        report.outcomes[1].status,
        Status::Skipped(Error::UnsupportedParameterArity(1))
    ));
    assert!(report.outcomes[2].is_failed());
    assert_eq!(report.outcomes[3].to_string(), "last() f32 => 1.5 (f32)");
    assert_eq!(report.summary().to_string(), "1 succeeded, 1 failed, 2 skipped");

    Ok(())
}

#[test]
fn resolve_imports_from_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_wat(
        dir.path(),
        "lib.wasm",
        r#"(module (func (export "seven") (result i32) (i32.const 7)))"#,
    )?;
    let path = write_wat(
        dir.path(),
        "main.wasm",
        r#"
(module
  (import "lib" "seven" (func $seven (result i32)))
  (func (export "eight") (result i32) (i32.add (call $seven) (i32.const 1)))
)
        "#,
    )?;

    let config = Config {
        strategy: ImportStrategy::File,
        import_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let report = session::run(&path, &config, Registry::new())?;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].to_string(), "eight() i32 => 8 (i32)");

    Ok(())
}

#[test]
fn missing_export_section_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(dir.path(), "empty.wasm", "(module (func))")?;

    let err = session::run(&path, &Config::default(), Registry::new()).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoExports)));

    Ok(())
}

#[test]
fn unknown_import_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(
        dir.path(),
        "unknown.wasm",
        r#"
(module
  (import "env" "missing" (func))
  (func (export "f"))
)
        "#,
    )?;

    let err = session::run(&path, &Config::default(), builtins::registry()?).unwrap_err();
    assert_eq!(err.to_string(), "could not read module");
    assert!(matches!(
        err.root_cause().downcast_ref::<Error>(),
        Some(Error::UnknownImport { field, .. }) if field == "missing"
    ));

    Ok(())
}

#[test]
fn verify_rejects_invalid_module() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(
        dir.path(),
        "bad.wasm",
        r#"(module (func (export "f") (result i32) (i64.const 1)))"#,
    )?;

    let config = Config {
        verify: true,
        ..Config::default()
    };
    let err = session::run(&path, &config, Registry::new()).unwrap_err();
    assert_eq!(err.to_string(), "could not verify module");

    Ok(())
}

#[test]
fn unsupported_helper_signature_does_not_stop_the_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_wat(
        dir.path(),
        "simd.wasm",
        r#"
(module
  (func $helper (param v128) (result v128) (local.get 0))
  (func (export "helper") (param v128) (result v128) (local.get 0))
  (func (export "answer") (result i32) (i32.const 42))
)
        "#,
    )?;

    let report = session::run(&path, &Config::default(), Registry::new())?;
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[0].is_skipped());
    assert_eq!(report.outcomes[1].to_string(), "answer() i32 => 42 (i32)");
    Ok(())
}
