//! Configuration types for background replacement runs

use crate::{
    error::{BgRemovalError, Result},
    types::Rgb,
    utils::NumericValidator,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base color-distance threshold
pub const DEFAULT_THRESHOLD: f64 = 80.0;
/// Minimum channel spread for a pixel to count as subject
pub const DEFAULT_MIN_SATURATION: u8 = 18;
/// Largest mean neighbor difference still considered a uniform backdrop
pub const DEFAULT_MAX_VARIANCE: u32 = 15;
/// Threshold multiplier inside the safe zone
pub const DEFAULT_SAFE_ZONE_FACTOR: f64 = 0.35;
/// Threshold multiplier for enclosed pockets
pub const DEFAULT_ISLAND_FACTOR: f64 = 0.9;
/// Threshold multiplier for fringe erosion
pub const DEFAULT_EROSION_FACTOR: f64 = 1.4;
pub const DEFAULT_EROSION_PASSES: u32 = 2;
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_OUTPUT_PREFIX: &str = "white_";

const MAX_EROSION_PASSES: u32 = 16;

/// Which subject detection policy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorPolicy {
    /// Channel spread plus a brightness floor, pixel-local
    Saturation,
    /// Channel spread, then 3x3 uniformity to let vivid solid backdrops go
    SaturationUniformity,
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self::SaturationUniformity
    }
}

impl std::fmt::Display for DetectorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saturation => write!(f, "saturation"),
            Self::SaturationUniformity => write!(f, "saturation-uniformity"),
        }
    }
}

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG at the configured quality, alpha dropped
    Jpeg,
    /// Lossless PNG, alpha kept
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg
    }
}

/// Run-wide tunables for a background replacement.
///
/// Every value is fixed for the duration of a run; there is no
/// process-wide mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    /// Base color-distance threshold against the background reference
    pub threshold: f64,

    /// Active subject detection policy
    pub detector: DetectorPolicy,

    /// Minimum `max - min` channel spread for subject pixels
    pub min_saturation: u8,

    /// Uniformity ceiling for the neighborhood-aware policy
    pub max_variance: u32,

    /// Fill color for removed background
    pub target_color: Rgb,

    /// Threshold multiplier inside the safe zone
    pub safe_zone_factor: f64,

    /// Threshold multiplier for island removal
    pub island_factor: f64,

    /// Threshold multiplier for edge erosion
    pub erosion_factor: f64,

    /// Number of boundary-shrinking passes
    pub erosion_passes: u32,

    /// Output container format
    pub output_format: OutputFormat,

    /// Encoder quality (1-100, JPEG only)
    pub quality: u8,

    /// Prefix for generated output file names
    pub output_prefix: String,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            detector: DetectorPolicy::default(),
            min_saturation: DEFAULT_MIN_SATURATION,
            max_variance: DEFAULT_MAX_VARIANCE,
            target_color: Rgb::WHITE,
            safe_zone_factor: DEFAULT_SAFE_ZONE_FACTOR,
            island_factor: DEFAULT_ISLAND_FACTOR,
            erosion_factor: DEFAULT_EROSION_FACTOR,
            erosion_passes: DEFAULT_EROSION_PASSES,
            output_format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use whitebg::{DetectorPolicy, RemovalConfig};
    ///
    /// let config = RemovalConfig::builder()
    ///     .threshold(60.0)
    ///     .detector(DetectorPolicy::Saturation)
    ///     .min_saturation(20)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.threshold, 60.0);
    /// ```
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }

    /// Load a configuration from a JSON file; missing keys take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| BgRemovalError::file_io_error("read configuration", path_ref, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            BgRemovalError::invalid_config(format!(
                "{} is not a valid configuration: {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Threshold or any multiplier not finite or not positive
    /// - Quality outside 1-100
    /// - More than 16 erosion passes
    /// - Output prefix containing a path separator
    ///
    /// ```rust
    /// use whitebg::RemovalConfig;
    ///
    /// let mut config = RemovalConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.quality = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        NumericValidator::validate_threshold(self.threshold, "threshold")?;
        NumericValidator::validate_threshold(self.safe_zone_factor, "safe zone factor")?;
        NumericValidator::validate_threshold(self.island_factor, "island factor")?;
        NumericValidator::validate_threshold(self.erosion_factor, "erosion factor")?;

        if self.quality == 0 || self.quality > 100 {
            return Err(BgRemovalError::config_value_error(
                "quality",
                self.quality,
                "1-100",
                Some(DEFAULT_QUALITY),
            ));
        }

        if self.erosion_passes > MAX_EROSION_PASSES {
            return Err(BgRemovalError::config_value_error(
                "erosion passes",
                self.erosion_passes,
                "0-16",
                Some(DEFAULT_EROSION_PASSES),
            ));
        }

        if self.output_prefix.contains(['/', '\\']) {
            return Err(BgRemovalError::invalid_config(format!(
                "output prefix '{}' must not contain path separators",
                self.output_prefix
            )));
        }

        Ok(())
    }
}

/// Builder for `RemovalConfig`
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    #[must_use]
    pub fn detector(mut self, detector: DetectorPolicy) -> Self {
        self.config.detector = detector;
        self
    }

    #[must_use]
    pub fn min_saturation(mut self, min_saturation: u8) -> Self {
        self.config.min_saturation = min_saturation;
        self
    }

    #[must_use]
    pub fn max_variance(mut self, max_variance: u32) -> Self {
        self.config.max_variance = max_variance;
        self
    }

    #[must_use]
    pub fn target_color(mut self, color: Rgb) -> Self {
        self.config.target_color = color;
        self
    }

    #[must_use]
    pub fn erosion_passes(mut self, passes: u32) -> Self {
        self.config.erosion_passes = passes;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set encoder quality; `build` rejects values outside 1-100
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    #[must_use]
    pub fn output_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.output_prefix = prefix.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RemovalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
