use crate::binary::types::ValueType;
use crate::error::Error;
use anyhow::{bail, Result};
use std::fmt::Display;

// https://webassembly.github.io/spec/core/exec/runtime.html#syntax-val
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I32(n) => {
                write!(f, "{n}")
            }
            Self::I64(n) => {
                write!(f, "{n}")
            }
            Self::F32(n) => {
                write!(f, "{n}")
            }
            Self::F64(n) => {
                write!(f, "{n}")
            }
        }
    }
}

macro_rules! into_into_value {
    ($($ty: ty => $variant: ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

into_into_value!(i32 => I32, i64 => I64, f32 => F32, f64 => F64);

macro_rules! try_from_value {
    ($($ty: ty => $variant: ident),*) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = Error;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(Error::ArgumentType {
                            expected: ValueType::$variant,
                            actual: other.value_type(),
                        }),
                    }
                }
            }
        )*
    };
}

try_from_value!(i32 => I32, i64 => I64, f32 => F32, f64 => F64);

impl From<Value> for wasmtime::Val {
    fn from(value: Value) -> Self {
        match value {
            Value::I32(v) => wasmtime::Val::I32(v),
            Value::I64(v) => wasmtime::Val::I64(v),
            Value::F32(v) => wasmtime::Val::F32(v.to_bits()),
            Value::F64(v) => wasmtime::Val::F64(v.to_bits()),
        }
    }
}

impl TryFrom<&wasmtime::Val> for Value {
    type Error = anyhow::Error;

    fn try_from(value: &wasmtime::Val) -> Result<Self> {
        let value = match value {
            wasmtime::Val::I32(v) => Value::I32(*v),
            wasmtime::Val::I64(v) => Value::I64(*v),
            wasmtime::Val::F32(bits) => Value::F32(f32::from_bits(*bits)),
            wasmtime::Val::F64(bits) => Value::F64(f64::from_bits(*bits)),
            other => bail!(Error::UnsupportedValueType(format!("{other:?}"))),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::Value;
    use crate::binary::types::ValueType;
    use pretty_assertions::assert_eq;

    #[test]
    fn value_type_follows_variant() {
        assert_eq!(Value::from(1_i32).value_type(), ValueType::I32);
        assert_eq!(Value::from(1_i64).value_type(), ValueType::I64);
        assert_eq!(Value::from(1.5_f32).value_type(), ValueType::F32);
        assert_eq!(Value::from(1.5_f64).value_type(), ValueType::F64);
    }

    #[test]
    fn extract_wrong_kind() {
        let err = i32::try_from(Value::F64(1.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected argument type: expected i32, got f64"
        );
    }

    #[test]
    fn float_bits_survive_engine_values() -> anyhow::Result<()> {
        let value = Value::F32(-0.5);
        let val: wasmtime::Val = value.into();
        assert_eq!(Value::try_from(&val)?, value);
        Ok(())
    }
}
