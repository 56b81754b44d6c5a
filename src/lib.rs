pub mod binary;
pub mod config;
pub mod error;
pub mod execution;
pub mod host;
pub mod session;

pub use execution::value::Value;
