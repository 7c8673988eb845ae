//! Color parsing utilities for the fill color option

use crate::{
    error::{BgRemovalError, Result},
    types::Rgb,
};

/// Utility for parsing fill colors from user input
pub struct ColorParser;

impl ColorParser {
    /// Parse either `r,g,b` decimal triples or `#RRGGBB` / `#RGB` hex.
    ///
    /// ```rust
    /// use whitebg::{utils::ColorParser, Rgb};
    ///
    /// assert_eq!(ColorParser::parse("255,255,255").unwrap(), Rgb::WHITE);
    /// assert_eq!(ColorParser::parse("#00f").unwrap(), Rgb::new(0, 0, 255));
    /// ```
    pub fn parse(input: &str) -> Result<Rgb> {
        let trimmed = input.trim();
        if trimmed.contains(',') {
            Self::parse_triple(trimmed)
        } else {
            Self::parse_hex(trimmed)
        }
    }

    /// Parse a `r,g,b` triple of decimal channel values
    pub fn parse_triple(input: &str) -> Result<Rgb> {
        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(BgRemovalError::invalid_config(format!(
                "Color '{}' must have exactly three components",
                input
            )));
        };

        let channel = |value: &str, name: &str| {
            value.parse::<u8>().map_err(|_| {
                BgRemovalError::invalid_config(format!(
                    "Invalid {} component '{}' in color (expected 0-255)",
                    name, value
                ))
            })
        };

        Ok(Rgb::new(channel(r, "red")?, channel(g, "green")?, channel(b, "blue")?))
    }

    /// Parse a hex color string, with or without the leading `#`
    pub fn parse_hex(hex: &str) -> Result<Rgb> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(BgRemovalError::invalid_config(
                "Color must be in #RRGGBB or #RGB format",
            ));
        }

        let component = |slice: &str, name: &str| {
            u8::from_str_radix(slice, 16).map_err(|_| {
                BgRemovalError::invalid_config(format!("Invalid {} component in hex color", name))
            })
        };

        match hex.len() {
            6 => Ok(Rgb::new(
                component(&hex[0..2], "red")?,
                component(&hex[2..4], "green")?,
                component(&hex[4..6], "blue")?,
            )),
            3 => Ok(Rgb::new(
                component(&hex[0..1], "red")? * 17,
                component(&hex[1..2], "green")? * 17,
                component(&hex[2..3], "blue")? * 17,
            )),
            _ => Err(BgRemovalError::invalid_config(
                "Color must be in #RRGGBB or #RGB format",
            )),
        }
    }

    /// Format a color as lowercase hex
    #[must_use]
    pub fn to_hex(color: &Rgb, include_hash: bool) -> String {
        let prefix = if include_hash { "#" } else { "" };
        format!("{}{:02x}{:02x}{:02x}", prefix, color.r, color.g, color.b)
    }
}
