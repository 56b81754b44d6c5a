pub mod module;
pub mod types;
pub mod validate;

pub use module::*;
pub use types::*;
