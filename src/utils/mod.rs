//! Shared utilities for configuration and input checking

pub mod color;
pub mod validation;

pub use color::ColorParser;
pub use validation::{BufferValidator, NumericValidator};
