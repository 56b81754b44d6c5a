use super::Registry;
use crate::binary::types::{FuncType, ValueType};
use anyhow::Result;

pub fn add3(x: i32) -> i32 {
    println!("add3 call");
    x.wrapping_add(3)
}

pub fn add5(x: i32) -> i32 {
    println!("add5 call");
    x.wrapping_add(5)
}

#[allow(non_snake_case)]
pub fn Println(p: i32) {
    println!("Println call");
    println!("{p}");
}

/// The host functions the `wasm-run` binary exposes to in-process imports.
pub fn registry() -> Result<Registry> {
    let i32_to_i32 = FuncType::new([ValueType::I32], [ValueType::I32]);

    let mut registry = Registry::new();
    registry.register_func("add3", i32_to_i32.clone(), add3)?;
    registry.register_func("add5", i32_to_i32, add5)?;
    registry.register_func("Println", FuncType::new([ValueType::I32], []), Println)?;
    Ok(registry)
}
