//! Pixel buffer validation utilities
//!
//! Geometry checks for decoded images before they are handed to the
//! pipeline as a raw sample buffer.

use crate::error::{BgRemovalError, Result};

/// Validator for decoded image geometry
pub struct BufferValidator;

impl BufferValidator {
    /// Validate image dimensions are within reasonable bounds
    pub fn validate_image_dimensions(width: u32, height: u32) -> Result<()> {
        const MAX_DIMENSION: u32 = 32768;
        const MIN_DIMENSION: u32 = 1;

        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(BgRemovalError::invalid_input(format!(
                "Image dimensions too small: {}x{}. Minimum: {}x{}",
                width, height, MIN_DIMENSION, MIN_DIMENSION
            )));
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BgRemovalError::invalid_input(format!(
                "Image dimensions too large: {}x{}. Maximum: {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        Ok(())
    }

    /// Validate that a sample buffer matches its declared geometry
    pub fn validate_buffer_len(len: usize, width: u32, height: u32, channels: u8) -> Result<()> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(usize::from(channels)))
            .ok_or_else(|| {
                BgRemovalError::invalid_input(format!(
                    "Image dimensions {}x{}x{} overflow",
                    width, height, channels
                ))
            })?;

        if len != expected {
            return Err(BgRemovalError::invalid_input(format!(
                "Sample buffer has {} bytes, expected {} for {}x{}x{}",
                len, expected, width, height, channels
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_bounds() {
        assert!(BufferValidator::validate_image_dimensions(1, 1).is_ok());
        assert!(BufferValidator::validate_image_dimensions(600, 800).is_ok());
        assert!(BufferValidator::validate_image_dimensions(0, 800).is_err());
        assert!(BufferValidator::validate_image_dimensions(40000, 10).is_err());
    }

    #[test]
    fn test_buffer_len() {
        assert!(BufferValidator::validate_buffer_len(48, 4, 4, 3).is_ok());
        assert!(BufferValidator::validate_buffer_len(64, 4, 4, 4).is_ok());
        assert!(BufferValidator::validate_buffer_len(47, 4, 4, 3).is_err());
    }
}
