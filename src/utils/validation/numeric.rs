//! Numeric validation utilities
//!
//! Range checks for the run-wide tunables before they reach the pipeline.

use crate::error::{BgRemovalError, Result};

/// Validator for numeric parameters
pub struct NumericValidator;

impl NumericValidator {
    /// A threshold or multiplier must be finite and strictly positive
    pub fn validate_threshold(value: f64, name: &str) -> Result<f64> {
        if !value.is_finite() {
            return Err(BgRemovalError::invalid_config(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        Self::validate_positive(value, name)
    }

    /// Validate encoder quality (1-100)
    pub fn validate_quality(value: u8) -> Result<u8> {
        Self::validate_range(value, 1, 100, "Quality")
    }

    /// Validate numeric range (inclusive)
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(BgRemovalError::invalid_config(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
        Ok(value)
    }

    /// Validate that a value is positive
    pub fn validate_positive<T>(value: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy + Default,
    {
        if value <= T::default() {
            return Err(BgRemovalError::invalid_config(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
        Ok(value)
    }
}
