//! Core types for background replacement

use crate::{
    config::OutputFormat,
    error::{BgRemovalError, Result},
    services::{ImageIOService, OutputFormatHandler},
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Interleaved channel layout of a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Three samples per pixel
    Rgb,
    /// Four samples per pixel, alpha last
    Rgba,
}

impl ChannelLayout {
    /// Map a raw channel count to a layout
    pub fn from_count(channels: u8) -> Result<Self> {
        match channels {
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(BgRemovalError::unsupported_format(format!(
                "{} channels per pixel (expected 3 or 4)",
                other
            ))),
        }
    }

    /// Samples per pixel
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    #[must_use]
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }
}

/// An RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space
    #[must_use]
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Channel spread, `max(R,G,B) - min(R,G,B)`
    #[must_use]
    pub fn saturation(&self) -> u8 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        max - min
    }

    /// Integer mean of the three channels
    #[must_use]
    pub fn brightness(&self) -> u8 {
        ((u16::from(self.r) + u16::from(self.g) + u16::from(self.b)) / 3) as u8
    }

    /// Sum of absolute channel differences
    #[must_use]
    pub fn manhattan(&self, other: &Rgb) -> u32 {
        u32::from(self.r.abs_diff(other.r))
            + u32::from(self.g.abs_diff(other.g))
            + u32::from(self.b.abs_diff(other.b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Exclusive mutable view over caller-owned interleaved samples.
///
/// The buffer is written in place; callers must treat the original
/// contents as consumed once a run has started.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    layout: ChannelLayout,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap a raw sample buffer after validating its geometry.
    ///
    /// Rejects zero dimensions, channel counts other than 3 or 4, and a
    /// length that is not exactly `width * height * channels`.
    pub fn new(data: &'a mut [u8], width: usize, height: usize, channels: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BgRemovalError::invalid_input(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let layout = ChannelLayout::from_count(channels)?;
        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(layout.count()))
            .ok_or_else(|| {
                BgRemovalError::invalid_input(format!(
                    "image dimensions {}x{} overflow the address space",
                    width, height
                ))
            })?;
        if data.len() != expected {
            return Err(BgRemovalError::invalid_input(format!(
                "buffer length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                layout.count()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Offset of the first sample of pixel `(x, y)`
    #[must_use]
    pub fn pixel_index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.layout.count()
    }

    #[must_use]
    pub fn rgb_at(&self, x: usize, y: usize) -> Rgb {
        let idx = self.pixel_index(x, y);
        Rgb::new(self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Overwrite the color channels of `(x, y)`; alpha becomes fully opaque.
    pub fn paint(&mut self, x: usize, y: usize, color: Rgb) {
        let idx = self.pixel_index(x, y);
        self.data[idx] = color.r;
        self.data[idx + 1] = color.g;
        self.data[idx + 2] = color.b;
        if self.layout.has_alpha() {
            self.data[idx + 3] = u8::MAX;
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }
}

/// Per-phase wall time of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub flood_fill_ms: u64,
    pub island_removal_ms: u64,
    pub edge_erosion_ms: u64,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalStats {
    /// Grid size of the run
    pub total_pixels: usize,
    /// Color sampled from pixel (0, 0)
    pub background: Rgb,
    /// Pixels painted by the corner-seeded flood fill
    pub flood_filled: usize,
    /// Enclosed pockets reclaimed by the island pass
    pub islands_removed: usize,
    /// Fringe pixels removed across all erosion passes
    pub eroded: usize,
    pub timings: PhaseTimings,
}

impl RemovalStats {
    #[must_use]
    pub fn new(total_pixels: usize, background: Rgb) -> Self {
        Self {
            total_pixels,
            background,
            flood_filled: 0,
            islands_removed: 0,
            eroded: 0,
            timings: PhaseTimings::default(),
        }
    }

    /// Pixels classified as background by any phase
    #[must_use]
    pub fn removed(&self) -> usize {
        self.flood_filled + self.islands_removed + self.eroded
    }

    #[must_use]
    pub fn removed_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.removed() as f64 / self.total_pixels as f64
        }
    }
}

/// Timing breakdown for a file-level run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image loading and decoding
    pub image_decode_ms: u64,
    /// The three pipeline phases together
    pub removal_ms: u64,
    /// Final image encoding (if saved)
    pub image_encode_ms: Option<u64>,
    /// Total end-to-end time
    pub total_ms: u64,
}

/// Result of a file- or image-level background replacement
#[derive(Debug, Clone)]
pub struct RemovalResult {
    /// The processed image, same channel layout as the decoded input
    pub image: DynamicImage,
    pub stats: RemovalStats,
    pub timings: ProcessingTimings,
    /// Original input path, when the image came from a file
    pub input_path: Option<PathBuf>,
}

impl RemovalResult {
    #[must_use]
    pub fn new(image: DynamicImage, stats: RemovalStats, timings: ProcessingTimings) -> Self {
        Self {
            image,
            stats,
            timings,
            input_path: None,
        }
    }

    #[must_use]
    pub fn with_input_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Encode and write the result, recording the encode time
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        let start = instant::Instant::now();
        ImageIOService::save_image(&self.image, path, format, quality)?;
        let encode_ms = start.elapsed().as_millis() as u64;
        self.timings.image_encode_ms = Some(encode_ms);
        self.timings.total_ms += encode_ms;
        Ok(())
    }

    /// Encode the result into memory
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let prepared = OutputFormatHandler::prepare_for_format(&self.image, format);
        ImageIOService::encode_to_vec(&prepared, format, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_metrics() {
        let skin = Rgb::new(210, 160, 140);
        assert_eq!(skin.saturation(), 70);
        assert_eq!(skin.brightness(), 170);

        let beige = Rgb::new(240, 235, 230);
        assert_eq!(beige.saturation(), 10);

        let a = Rgb::new(100, 100, 100);
        let b = Rgb::new(130, 140, 100);
        assert!((a.distance(&b) - 50.0).abs() < f64::EPSILON);
        assert_eq!(a.manhattan(&b), 70);
    }

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::from_count(3).unwrap(), ChannelLayout::Rgb);
        assert_eq!(ChannelLayout::from_count(4).unwrap(), ChannelLayout::Rgba);
        assert!(ChannelLayout::from_count(1).is_err());
        assert!(ChannelLayout::from_count(2).is_err());
    }

    #[test]
    fn test_pixel_buffer_rejects_bad_geometry() {
        let mut data = vec![0u8; 12];
        assert!(PixelBuffer::new(&mut data, 0, 4, 3).is_err());
        assert!(PixelBuffer::new(&mut data, 4, 0, 3).is_err());
        assert!(PixelBuffer::new(&mut data, 2, 2, 4).is_err());
        assert!(PixelBuffer::new(&mut data, 2, 2, 2).is_err());
        assert!(PixelBuffer::new(&mut data, 2, 2, 3).is_ok());
    }

    #[test]
    fn test_paint_forces_opaque_alpha() {
        let mut data = vec![10, 20, 30, 0, 40, 50, 60, 128];
        let mut buffer = PixelBuffer::new(&mut data, 2, 1, 4).unwrap();
        buffer.paint(1, 0, Rgb::WHITE);
        assert_eq!(buffer.rgb_at(0, 0), Rgb::new(10, 20, 30));
        assert_eq!(buffer.rgb_at(1, 0), Rgb::WHITE);
        assert_eq!(data, vec![10, 20, 30, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn test_stats_ratio() {
        let mut stats = RemovalStats::new(10, Rgb::WHITE);
        assert_eq!(stats.removed_ratio(), 0.0);
        stats.flood_filled = 4;
        stats.islands_removed = 1;
        assert_eq!(stats.removed(), 5);
        assert!((stats.removed_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
