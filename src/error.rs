use crate::binary::types::{FuncType, ValueType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("host function '{0}' is already registered")]
    DuplicateName(String),
    #[error("not found import '{field}' in module '{module}'")]
    UnknownImport { module: String, field: String },
    #[error("cannot resolve import module '{module}'")]
    ImportResolution {
        module: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("import '{module}.{field}' expects {expected}, but found {actual}")]
    IncompatibleImportType {
        module: String,
        field: String,
        expected: FuncType,
        actual: FuncType,
    },
    #[error("host function '{name}' is declared as {declared}, but the native function is {native}")]
    SignatureMismatch {
        name: String,
        declared: FuncType,
        native: FuncType,
    },
    #[error("module has no export section")]
    NoExports,
    #[error("running exported functions with more than one return value is not supported ({0} results)")]
    UnsupportedReturnArity(usize),
    #[error("running exported functions with input parameters is not supported ({0} params)")]
    UnsupportedParameterArity(usize),
    #[error("not found function by index: {0}")]
    NotFoundFunction(u32),
    #[error("not found function type by index: {0}")]
    NotFoundFuncType(u32),
    #[error("function type {0} uses unsupported value types")]
    UnsupportedFuncType(u32),
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("unexpected argument type: expected {expected}, got {actual}")]
    ArgumentType {
        expected: ValueType,
        actual: ValueType,
    },
}
