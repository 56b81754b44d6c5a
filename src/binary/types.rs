use crate::error::Error;
use std::fmt::{self, Display, Formatter};

// https://webassembly.github.io/spec/core/binary/types.html#value-types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I32, // 0x7F
    I64, // 0x7E
    F32, // 0x7D
    F64, // 0x7C
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        };
        f.write_str(name)
    }
}

impl TryFrom<wasmparser::ValType> for ValueType {
    type Error = Error;

    fn try_from(value_type: wasmparser::ValType) -> Result<Self, Self::Error> {
        match value_type {
            wasmparser::ValType::I32 => Ok(Self::I32),
            wasmparser::ValType::I64 => Ok(Self::I64),
            wasmparser::ValType::F32 => Ok(Self::F32),
            wasmparser::ValType::F64 => Ok(Self::F64),
            other => Err(Error::UnsupportedValueType(format!("{other:?}"))),
        }
    }
}

impl From<ValueType> for wasmtime::ValType {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::I32 => wasmtime::ValType::I32,
            ValueType::I64 => wasmtime::ValType::I64,
            ValueType::F32 => wasmtime::ValType::F32,
            ValueType::F64 => wasmtime::ValType::F64,
        }
    }
}

// https://webassembly.github.io/spec/core/binary/types.html#function-types
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FuncType {
    pub fn new(
        params: impl IntoIterator<Item = ValueType>,
        results: impl IntoIterator<Item = ValueType>,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }
}

impl Display for FuncType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.results))
    }
}

impl TryFrom<&wasmparser::FuncType> for FuncType {
    type Error = Error;

    fn try_from(func_type: &wasmparser::FuncType) -> Result<Self, Self::Error> {
        let params = func_type
            .params()
            .iter()
            .map(|ty| ValueType::try_from(*ty))
            .collect::<Result<Vec<_>, _>>()?;
        let results = func_type
            .results()
            .iter()
            .map(|ty| ValueType::try_from(*ty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { params, results })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDesc {
    Func(u32),
    Table(u32),
    Memory(u32),
    Global(u32),
}

impl ExportDesc {
    /// Maps a raw export entry onto the descriptor. Tags belong to the
    /// exception-handling proposal and have no counterpart here.
    pub fn from_parts(kind: wasmparser::ExternalKind, index: u32) -> Option<Self> {
        match kind {
            wasmparser::ExternalKind::Func => Some(Self::Func(index)),
            wasmparser::ExternalKind::Table => Some(Self::Table(index)),
            wasmparser::ExternalKind::Memory => Some(Self::Memory(index)),
            wasmparser::ExternalKind::Global => Some(Self::Global(index)),
            _ => None,
        }
    }

    pub fn kind(&self) -> ExternalKind {
        match self {
            ExportDesc::Func(_) => ExternalKind::Func,
            ExportDesc::Table(_) => ExternalKind::Table,
            ExportDesc::Memory(_) => ExternalKind::Memory,
            ExportDesc::Global(_) => ExternalKind::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Func,
    Table,
    Memory,
    Global,
}

impl Display for ExternalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternalKind::Func => "func",
            ExternalKind::Table => "table",
            ExternalKind::Memory => "memory",
            ExternalKind::Global => "global",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub desc: ExportDesc,
}

/// A `(module, field)` pair from an import section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportRef {
    pub module: String,
    pub field: String,
}

impl ImportRef {
    pub fn new(module: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            field: field.into(),
        }
    }
}

impl Display for ImportRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.field)
    }
}
