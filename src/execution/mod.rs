pub mod driver;
pub mod engine;
pub mod importer;
pub mod value;

pub use driver::*;
pub use engine::*;
pub use importer::*;
pub use value::*;
