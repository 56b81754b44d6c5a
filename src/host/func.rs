use super::HostCallable;
use crate::{
    binary::types::{FuncType, ValueType},
    error::Error,
    Value,
};
use anyhow::{bail, Context as _, Result};
use std::sync::Arc;

/// A Rust type that maps onto a single WASM value type.
pub trait WasmTy: Sized + Send + Sync + 'static {
    const TYPE: ValueType;
    fn from_value(value: Value) -> Result<Self>;
    fn into_value(self) -> Value;
}

macro_rules! impl_wasm_ty {
    ($($ty: ty => $variant: ident),*) => {
        $(
            impl WasmTy for $ty {
                const TYPE: ValueType = ValueType::$variant;

                fn from_value(value: Value) -> Result<Self> {
                    Ok(<$ty>::try_from(value)?)
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_wasm_ty!(i32 => I32, i64 => I64, f32 => F32, f64 => F64);

/// What a host function may return: nothing or one value.
pub trait WasmResults {
    fn types() -> Vec<ValueType>;
    fn into_values(self) -> Vec<Value>;
}

impl WasmResults for () {
    fn types() -> Vec<ValueType> {
        vec![]
    }

    fn into_values(self) -> Vec<Value> {
        vec![]
    }
}

macro_rules! impl_wasm_results {
    ($($ty: ty),*) => {
        $(
            impl WasmResults for $ty {
                fn types() -> Vec<ValueType> {
                    vec![<$ty as WasmTy>::TYPE]
                }

                fn into_values(self) -> Vec<Value> {
                    vec![self.into_value()]
                }
            }
        )*
    };
}

impl_wasm_results!(i32, i64, f32, f64);

/// A native function whose WASM signature can be derived from its Rust type.
pub trait IntoHostFunc<Params, Results>: Send + Sync + 'static {
    fn func_type() -> FuncType;
    fn into_callable(self) -> HostCallable;
}

macro_rules! impl_into_host_func {
    ($($param: ident $arg: ident),*) => {
        impl<F, R, $($param,)*> IntoHostFunc<($($param,)*), R> for F
        where
            F: Fn($($param),*) -> R + Send + Sync + 'static,
            R: WasmResults,
            $($param: WasmTy,)*
        {
            fn func_type() -> FuncType {
                FuncType::new([$($param::TYPE),*], R::types())
            }

            #[allow(unused_mut, unused_variables)]
            fn into_callable(self) -> HostCallable {
                let expected = <Self as IntoHostFunc<($($param,)*), R>>::func_type().params.len();
                Arc::new(move |args: &[Value]| -> Result<Vec<Value>> {
                    if args.len() != expected {
                        bail!(Error::ArgumentCount {
                            expected,
                            actual: args.len(),
                        });
                    }
                    let mut args = args.iter().copied();
                    $(
                        let $arg = $param::from_value(args.next().context("missing argument")?)?;
                    )*
                    Ok((self)($($arg),*).into_values())
                })
            }
        }
    };
}

impl_into_host_func!();
impl_into_host_func!(A1 a1);
impl_into_host_func!(A1 a1, A2 a2);
impl_into_host_func!(A1 a1, A2 a2, A3 a3);
impl_into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4);

#[cfg(test)]
mod test {
    use super::IntoHostFunc;
    use crate::{
        binary::types::{FuncType, ValueType},
        Value,
    };
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn signature_of<P, R, F: IntoHostFunc<P, R>>(_: &F) -> FuncType {
        F::func_type()
    }

    #[test]
    fn derive_signatures() {
        assert_eq!(signature_of(&|| {}), FuncType::default());
        assert_eq!(
            signature_of(&|_: i64, _: f32| 1.0_f64),
            FuncType::new([ValueType::I64, ValueType::F32], [ValueType::F64])
        );
        assert_eq!(
            signature_of(&|_: i32| {}),
            FuncType::new([ValueType::I32], [])
        );
    }

    #[test]
    fn typed_call_converts_arguments() -> Result<()> {
        let callable = (|a: i32, b: i64| a as i64 * b).into_callable();
        assert_eq!(
            callable(&[Value::I32(6), Value::I64(7)])?,
            vec![Value::I64(42)]
        );

        let err = callable(&[Value::I64(6), Value::I64(7)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected argument type: expected i32, got i64"
        );
        Ok(())
    }
}
