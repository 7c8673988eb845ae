//! Output format handling service
//!
//! Channel conversion before encoding and the naming scheme for generated
//! files.

use crate::config::{OutputFormat, RemovalConfig};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Service for output format conversions and output naming
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert `image` to the channel layout the format can store.
    ///
    /// JPEG has no alpha, so RGBA input is flattened to RGB; PNG keeps
    /// whatever layout the pipeline produced.
    #[must_use]
    pub fn prepare_for_format(image: &DynamicImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Jpeg => match image {
                DynamicImage::ImageRgb8(_) => image.clone(),
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            },
            OutputFormat::Png => match image {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image.clone(),
                other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            },
        }
    }

    /// File extension for a format, without the dot
    ///
    /// ```rust
    /// use whitebg::{services::OutputFormatHandler, OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        matches!(format, OutputFormat::Png)
    }

    /// Generated file name: `{prefix}T{threshold}_Q{quality}_{stem}.{ext}`
    ///
    /// ```rust
    /// use whitebg::{services::OutputFormatHandler, RemovalConfig};
    ///
    /// let name = OutputFormatHandler::output_file_name("shots/portrait.png", &RemovalConfig::default());
    /// assert_eq!(name, "white_T80_Q90_portrait.jpg");
    /// ```
    #[must_use]
    pub fn output_file_name<P: AsRef<Path>>(input: P, config: &RemovalConfig) -> String {
        let stem = input
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        format!(
            "{}T{:.0}_Q{}_{}.{}",
            config.output_prefix,
            config.threshold,
            config.quality,
            stem,
            Self::get_extension(config.output_format)
        )
    }

    /// Full output path: next to the input, or inside `output_dir` when given
    #[must_use]
    pub fn output_path<P: AsRef<Path>>(
        input: P,
        output_dir: Option<&Path>,
        config: &RemovalConfig,
    ) -> PathBuf {
        let input = input.as_ref();
        let name = Self::output_file_name(input, config);
        match output_dir {
            Some(dir) => dir.join(name),
            None => input
                .parent()
                .map_or_else(|| PathBuf::from(&name), |parent| parent.join(&name)),
        }
    }
}
