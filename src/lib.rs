#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # whitebg
//!
//! Replace the near-uniform background of portrait and ID photos with a
//! solid color, without any segmentation model.
//!
//! The background reference is sampled from the top-left pixel and grown
//! inward from the four corners by a breadth-first flood fill. A subject
//! detector shields saturated, textured pixels inside a central safe zone.
//! Two clean-up phases follow: island removal reclaims enclosed pockets of
//! background, and edge erosion strips the fringe left along the subject.
//!
//! ## Raw buffers
//!
//! ```rust
//! use whitebg::remove_background;
//!
//! // 4x4 RGB, flat grey
//! let mut pixels = vec![200u8; 4 * 4 * 3];
//! let stats = remove_background(&mut pixels, 4, 4, 3, 80.0)?;
//! assert!(pixels.iter().all(|&v| v == 255));
//! assert_eq!(stats.removed(), 16);
//! # Ok::<(), whitebg::BgRemovalError>(())
//! ```
//!
//! ## Files
//!
//! ```rust,no_run
//! use whitebg::{BackgroundRemovalProcessor, DetectorPolicy, RemovalConfig};
//!
//! let config = RemovalConfig::builder()
//!     .threshold(70.0)
//!     .detector(DetectorPolicy::SaturationUniformity)
//!     .build()?;
//! let mut processor = BackgroundRemovalProcessor::new(config)?;
//! let (_result, written) = processor.process_file_to_output("portrait.jpg", None)?;
//! println!("wrote {}", written.display());
//! # Ok::<(), whitebg::BgRemovalError>(())
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): the `whitebg` binary, tracing subscriber setup and progress bars
//! - `tracing-json`: JSON log output for the binary
//!
//! Library-only usage:
//!
//! ```toml
//! [dependencies]
//! whitebg = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

use tokio::io::AsyncRead;

pub use config::{DetectorPolicy, OutputFormat, RemovalConfig, RemovalConfigBuilder};
pub use error::{BgRemovalError, Result};
pub use pipeline::detector::{
    SaturationDetector, SubjectClassifier, SubjectDetector, UniformityDetector,
};
pub use processor::BackgroundRemovalProcessor;
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, OutputFormatHandler,
    ProcessingStage, ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use types::{
    ChannelLayout, PhaseTimings, PixelBuffer, ProcessingTimings, RemovalResult, RemovalStats, Rgb,
};
pub use utils::{BufferValidator, ColorParser, NumericValidator};

#[cfg(feature = "cli")]
pub use tracing_config::{events, init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Replace the background of an interleaved RGB/RGBA buffer in place.
///
/// Uses the default configuration with the given base `threshold`. The
/// buffer is consumed: once the call starts, its original contents are
/// gone except for pixels classified as subject.
///
/// # Errors
/// - `InvalidInput` for zero dimensions or a length that does not match
///   `width * height * channels` (the buffer is not touched)
/// - `UnsupportedFormat` for a channel count other than 3 or 4
/// - `InvalidConfig` for a non-finite or non-positive threshold
/// - `Allocation` when working memory cannot be reserved
pub fn remove_background(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    channels: u8,
    threshold: f64,
) -> Result<RemovalStats> {
    let config = RemovalConfig {
        threshold,
        ..RemovalConfig::default()
    };
    let mut buffer = PixelBuffer::new(pixels, width, height, channels)?;
    pipeline::run(&mut buffer, &config)
}

/// Replace the background of an already wrapped buffer with full control
/// over every tunable.
pub fn remove_background_with_config(
    buffer: &mut PixelBuffer<'_>,
    config: &RemovalConfig,
) -> Result<RemovalStats> {
    pipeline::run(buffer, config)
}

/// Copying variant that leaves `pixels` untouched.
pub fn remove_background_to_vec(
    pixels: &[u8],
    width: usize,
    height: usize,
    channels: u8,
    config: &RemovalConfig,
) -> Result<(Vec<u8>, RemovalStats)> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(pixels.len())
        .map_err(|_| BgRemovalError::allocation("output copy", pixels.len()))?;
    copy.extend_from_slice(pixels);

    let mut buffer = PixelBuffer::new(&mut copy, width, height, channels)?;
    let stats = pipeline::run(&mut buffer, config)?;
    Ok((copy, stats))
}

/// Replace the background of a decoded image
///
/// # Examples
/// ```rust
/// use whitebg::{remove_background_from_image, RemovalConfig};
/// use image::{DynamicImage, RgbImage, Rgb};
///
/// let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([230, 230, 225])));
/// let result = remove_background_from_image(&img, &RemovalConfig::default())?;
/// assert_eq!(result.image.to_rgb8().get_pixel(0, 0).0, [255, 255, 255]);
/// # Ok::<(), whitebg::BgRemovalError>(())
/// ```
pub fn remove_background_from_image(
    image: &image::DynamicImage,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?.process_image(image)
}

/// Decode JPEG or PNG bytes and replace the background
///
/// ```rust,no_run
/// use whitebg::{remove_background_from_bytes, RemovalConfig};
///
/// # fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let config = RemovalConfig::default();
/// let result = remove_background_from_bytes(&upload, &config)?;
/// let jpeg = result.to_bytes(config.output_format, config.quality)?;
/// # Ok(())
/// # }
/// ```
pub fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?.process_bytes(image_bytes)
}

/// Read an image from an async stream and replace the background
///
/// ```rust,no_run
/// use whitebg::{remove_background_from_reader, RemovalConfig, OutputFormat};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("portrait.jpg").await?;
/// let mut result = remove_background_from_reader(file, &RemovalConfig::default()).await?;
/// result.save("white_portrait.png", OutputFormat::Png, 90)?;
/// # Ok(())
/// # }
/// ```
pub async fn remove_background_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_reader(reader)
        .await
}
