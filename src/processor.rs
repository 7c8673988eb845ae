//! Image-level background replacement processor
//!
//! `BackgroundRemovalProcessor` bridges decoded images and the raw-buffer
//! pipeline: it converts to 8-bit interleaved samples, runs the three
//! phases, rebuilds an image and records timings. The CLI and the library
//! convenience functions both go through it.

use crate::{
    config::RemovalConfig,
    error::{BgRemovalError, Result},
    pipeline,
    services::{ImageIOService, OutputFormatHandler, ProcessingStage, ProgressTracker},
    types::{PixelBuffer, ProcessingTimings, RemovalResult},
    utils::BufferValidator,
};
use image::{DynamicImage, RgbImage, RgbaImage};
use instant::Instant;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Runs background replacement over decoded images and files
pub struct BackgroundRemovalProcessor {
    config: RemovalConfig,
    progress_tracker: Option<ProgressTracker>,
}

impl BackgroundRemovalProcessor {
    /// Create a processor; the configuration is validated up front.
    ///
    /// # Errors
    /// Returns `BgRemovalError::InvalidConfig` for out-of-range tunables.
    pub fn new(config: RemovalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress_tracker: None,
        })
    }

    /// Attach a progress tracker that receives stage events
    #[must_use]
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress_tracker = Some(tracker);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    fn report_stage(&mut self, stage: ProcessingStage) {
        if let Some(ref mut tracker) = self.progress_tracker {
            tracker.report_stage(stage);
        }
    }

    /// Restart the tracker clock for a new input
    fn begin(&mut self) {
        if let Some(ref mut tracker) = self.progress_tracker {
            tracker.reset();
        }
    }

    /// Report the outcome of a public entry point to the tracker
    fn finish(&mut self, outcome: Result<RemovalResult>) -> Result<RemovalResult> {
        match outcome {
            Ok(result) => {
                self.report_stage(ProcessingStage::Completed);
                if let Some(ref tracker) = self.progress_tracker {
                    tracker.report_completion(result.timings.clone());
                }
                Ok(result)
            },
            Err(e) => {
                if let Some(ref tracker) = self.progress_tracker {
                    tracker.report_error(&e.to_string());
                }
                Err(e)
            },
        }
    }

    /// Replace the background of a decoded image.
    ///
    /// Images with an alpha channel are processed as RGBA and keep their
    /// alpha outside replaced pixels; everything else becomes RGB.
    ///
    /// # Errors
    /// - Image dimensions outside 1..=32768
    /// - Working memory exhaustion inside the pipeline
    #[instrument(
        skip(self, image),
        fields(dimensions = %format!("{}x{}", image.width(), image.height()))
    )]
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<RemovalResult> {
        self.begin();
        let outcome = self.process_decoded(image, 0);
        self.finish(outcome)
    }

    /// Run the pipeline on a decoded image; `decode_ms` is folded into the timings
    fn process_decoded(&mut self, image: &DynamicImage, decode_ms: u64) -> Result<RemovalResult> {
        let start = Instant::now();
        let mut result = self.replace_background(image)?;
        result.timings.image_decode_ms = decode_ms;
        result.timings.total_ms = decode_ms + start.elapsed().as_millis() as u64;
        Ok(result)
    }

    fn replace_background(&mut self, image: &DynamicImage) -> Result<RemovalResult> {
        let (width, height) = (image.width(), image.height());
        BufferValidator::validate_image_dimensions(width, height)?;

        self.report_stage(ProcessingStage::PixelPreparation);
        let (mut samples, channels) = if image.color().has_alpha() {
            (image.to_rgba8().into_raw(), 4u8)
        } else {
            (image.to_rgb8().into_raw(), 3u8)
        };
        BufferValidator::validate_buffer_len(samples.len(), width, height, channels)?;

        self.report_stage(ProcessingStage::BackgroundReplacement);
        let removal_start = Instant::now();
        let mut buffer = PixelBuffer::new(&mut samples, width as usize, height as usize, channels)?;
        let stats = pipeline::run(&mut buffer, &self.config)?;
        let timings = ProcessingTimings {
            removal_ms: removal_start.elapsed().as_millis() as u64,
            ..ProcessingTimings::default()
        };

        debug!(
            "Replaced {} of {} pixels ({:.1}%) against background {}",
            stats.removed(),
            stats.total_pixels,
            stats.removed_ratio() * 100.0,
            stats.background
        );

        let processed = if channels == 4 {
            RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
        .ok_or_else(|| {
            BgRemovalError::processing_stage_error(
                "image reconstruction",
                "sample buffer does not match image dimensions",
                Some(&format!("{}x{}x{}", width, height, channels)),
            )
        })?;

        Ok(RemovalResult::new(processed, stats, timings))
    }

    /// Decode an in-memory image and process it
    pub fn process_bytes(&mut self, image_bytes: &[u8]) -> Result<RemovalResult> {
        self.begin();
        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let outcome = ImageIOService::load_from_bytes(image_bytes).and_then(|image| {
            let decode_ms = decode_start.elapsed().as_millis() as u64;
            self.process_decoded(&image, decode_ms)
        });
        self.finish(outcome)
    }

    /// Read an async stream to the end and process it
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &mut self,
        reader: R,
    ) -> Result<RemovalResult> {
        self.begin();
        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let outcome = match ImageIOService::load_from_reader(reader).await {
            Ok(image) => {
                let decode_ms = decode_start.elapsed().as_millis() as u64;
                self.process_decoded(&image, decode_ms)
            },
            Err(e) => Err(e),
        };
        self.finish(outcome)
    }

    fn load_and_process(&mut self, input_path: &Path) -> Result<RemovalResult> {
        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let image = ImageIOService::load_image(input_path)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let result = self.process_decoded(&image, decode_ms)?;
        Ok(result.with_input_path(input_path))
    }

    /// Load and process an image file
    pub fn process_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<RemovalResult> {
        self.begin();
        let outcome = self.load_and_process(input_path.as_ref());
        self.finish(outcome)
    }

    /// Process a file and write the result under the generated output name.
    ///
    /// The output lands next to the input unless `output_dir` is given.
    /// Returns the result together with the path written.
    pub fn process_file_to_output<P: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_dir: Option<&Path>,
    ) -> Result<(RemovalResult, PathBuf)> {
        let input_path_ref = input_path.as_ref();
        let output_path = OutputFormatHandler::output_path(input_path_ref, output_dir, &self.config);

        self.begin();
        let outcome = self.load_and_process(input_path_ref).and_then(|mut result| {
            self.report_stage(ProcessingStage::FileSaving);
            result.save(&output_path, self.config.output_format, self.config.quality)?;
            Ok(result)
        });
        let result = self.finish(outcome)?;

        info!(
            "Saved {} ({} pixels replaced)",
            output_path.display(),
            result.stats.removed()
        );
        Ok((result, output_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::OutputFormat, types::Rgb};
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn grey_with_patch() -> DynamicImage {
        let mut img = RgbImage::from_pixel(10, 10, image::Rgb([200, 200, 200]));
        for y in 4..6 {
            for x in 4..6 {
                img.put_pixel(x, y, image::Rgb([180, 90, 60]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = RemovalConfig {
            threshold: 0.0,
            ..RemovalConfig::default()
        };
        assert!(BackgroundRemovalProcessor::new(config).is_err());
    }

    #[test]
    fn test_process_image_keeps_subject() {
        let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
        let result = processor.process_image(&grey_with_patch()).unwrap();
        let rgb = result.image.to_rgb8();

        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(9, 9).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(4, 4).0, [180, 90, 60]);
        assert_eq!(result.stats.removed(), 96);
        assert_eq!(result.stats.background, Rgb::new(200, 200, 200));
        assert!(matches!(result.image, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_rgba_input_stays_rgba() {
        let mut img = RgbaImage::from_pixel(6, 6, Rgba([50, 60, 70, 10]));
        img.put_pixel(3, 3, Rgba([220, 40, 40, 77]));
        let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
        let result = processor.process_image(&DynamicImage::ImageRgba8(img)).unwrap();

        let out = result.image.as_rgba8().unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(3, 3).0, [220, 40, 40, 77]);
    }

    #[test]
    fn test_process_bytes_records_decode_time() {
        let bytes = ImageIOService::encode_to_vec(&grey_with_patch(), OutputFormat::Png, 90).unwrap();
        let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
        let result = processor.process_bytes(&bytes).unwrap();

        assert_eq!(result.dimensions(), (10, 10));
        assert!(result.timings.total_ms >= result.timings.image_decode_ms);
        assert!(processor.process_bytes(b"garbage").is_err());
    }

    #[test]
    fn test_process_file_to_output_uses_generated_name() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("portrait.png");
        ImageIOService::save_image(&grey_with_patch(), &input, OutputFormat::Png, 90).unwrap();

        let config = RemovalConfig::builder()
            .output_format(OutputFormat::Png)
            .build()
            .unwrap();
        let mut processor = BackgroundRemovalProcessor::new(config)
            .unwrap()
            .with_progress(ProgressTracker::no_op());
        let (result, output) = processor.process_file_to_output(&input, None).unwrap();

        assert_eq!(output, dir.path().join("white_T80_Q90_portrait.png"));
        assert!(output.exists());
        assert_eq!(result.input_path.as_deref(), Some(input.as_path()));
        assert!(result.timings.image_encode_ms.is_some());

        let reloaded = ImageIOService::load_image(&output).unwrap().to_rgb8();
        assert_eq!(reloaded.get_pixel(5, 5).0, [180, 90, 60]);
        assert_eq!(reloaded.get_pixel(0, 9).0, [255, 255, 255]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
        let err = processor.process_file("/nonexistent/portrait.jpg").unwrap_err();
        assert!(matches!(err, BgRemovalError::Io(_)));
    }
}
