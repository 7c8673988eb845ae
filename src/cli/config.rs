//! Conversion from parsed arguments to a `RemovalConfig`

use crate::cli::main_impl::{Cli, CliDetector, CliOutputFormat};
use crate::{
    config::{DetectorPolicy, OutputFormat, RemovalConfig},
    utils::{ColorParser, NumericValidator},
};
use anyhow::{Context, Result};

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Start from `--config` (or defaults) and apply every flag that was given
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        let mut config = match &cli.config {
            Some(path) => RemovalConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => RemovalConfig::default(),
        };

        if let Some(threshold) = cli.threshold {
            config.threshold = threshold;
        }
        if let Some(quality) = cli.quality {
            config.quality = quality;
        }
        if let Some(format) = cli.format {
            config.output_format = match format {
                CliOutputFormat::Jpeg => OutputFormat::Jpeg,
                CliOutputFormat::Png => OutputFormat::Png,
            };
        }
        if let Some(prefix) = &cli.prefix {
            config.output_prefix.clone_from(prefix);
        }
        if let Some(detector) = cli.detector {
            config.detector = match detector {
                CliDetector::Saturation => DetectorPolicy::Saturation,
                CliDetector::Uniformity => DetectorPolicy::SaturationUniformity,
            };
        }
        if let Some(min_saturation) = cli.min_saturation {
            config.min_saturation = min_saturation;
        }
        if let Some(max_variance) = cli.max_variance {
            config.max_variance = max_variance;
        }
        if let Some(color) = &cli.target_color {
            config.target_color = ColorParser::parse(color).context("Invalid --target-color")?;
        }
        if let Some(passes) = cli.erosion_passes {
            config.erosion_passes = passes;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Argument combinations clap cannot check on its own
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if let Some(quality) = cli.quality {
            NumericValidator::validate_quality(quality)?;
        }

        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid --pattern '{}'", pattern))?;
        }

        let stdin_inputs = cli.input.iter().filter(|i| i.as_str() == "-").count();
        if stdin_inputs > 0 && cli.input.len() > 1 {
            anyhow::bail!("stdin (-) cannot be combined with other inputs");
        }

        Ok(())
    }
}
