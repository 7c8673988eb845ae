//! Validation helpers shared by the library and the CLI

pub mod buffer;
pub mod numeric;

pub use buffer::BufferValidator;
pub use numeric::NumericValidator;
