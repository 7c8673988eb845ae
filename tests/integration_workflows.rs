//! File, stream and configuration workflows end to end

use image::{DynamicImage, RgbImage, Rgba, RgbaImage};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use whitebg::{
    remove_background_from_bytes, remove_background_from_image, remove_background_from_reader,
    BackgroundRemovalProcessor, DetectorPolicy, ImageIOService, OutputFormat, OutputFormatHandler,
    ProcessingStage, ProcessingTimings, ProgressReporter, ProgressTracker, ProgressUpdate,
    RemovalConfig, Result, Rgb,
};

/// Light grey backdrop with a warm 4x4 block in the middle
fn portrait(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, image::Rgb([200, 200, 200]));
    let (cx, cy) = (width / 2, height / 2);
    for y in cy - 2..cy + 2 {
        for x in cx - 2..cx + 2 {
            img.put_pixel(x, y, image::Rgb([180, 90, 60]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn png_config() -> RemovalConfig {
    RemovalConfig::builder()
        .output_format(OutputFormat::Png)
        .build()
        .unwrap()
}

#[derive(Clone, Default)]
struct RecordingReporter {
    stages: Arc<Mutex<Vec<ProcessingStage>>>,
    completions: Arc<Mutex<usize>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl ProgressReporter for RecordingReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.stages.lock().unwrap().push(update.stage);
    }

    fn report_completion(&self, _timings: ProcessingTimings) {
        *self.completions.lock().unwrap() += 1;
    }

    fn report_error(&self, _stage: ProcessingStage, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

#[test]
fn test_png_file_round_trip() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("portrait.png");
    ImageIOService::save_image(&portrait(16, 16), &input, OutputFormat::Png, 90)?;

    let mut processor = BackgroundRemovalProcessor::new(png_config())?;
    let (result, output) = processor.process_file_to_output(&input, None)?;

    assert_eq!(output, dir.path().join("white_T80_Q90_portrait.png"));
    assert_eq!(result.stats.removed(), 16 * 16 - 16);

    let reloaded = ImageIOService::load_image(&output)?.to_rgb8();
    assert_eq!(reloaded.dimensions(), (16, 16));
    assert_eq!(reloaded.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(reloaded.get_pixel(8, 8).0, [180, 90, 60]);
    Ok(())
}

#[test]
fn test_jpeg_output_into_directory() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("id photo.jpg");
    ImageIOService::save_image(&portrait(48, 48), &input, OutputFormat::Jpeg, 95)?;
    let out_dir = dir.path().join("nested").join("out");

    let config = RemovalConfig::builder()
        .threshold(60.0)
        .quality(75)
        .output_prefix("bg_")
        .build()?;
    let mut processor = BackgroundRemovalProcessor::new(config)?;
    let (_, output) = processor.process_file_to_output(&input, Some(&out_dir))?;

    assert_eq!(output, out_dir.join("bg_T60_Q75_id photo.jpg"));
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));

    // the corner block is far from the subject, so it decodes close to white
    let reloaded = ImageIOService::load_image(&output)?.to_rgb8();
    let corner = reloaded.get_pixel(0, 0).0;
    assert!(corner.iter().all(|&c| c > 240), "{corner:?}");
    Ok(())
}

#[test]
fn test_rgba_png_keeps_alpha_channel() -> Result<()> {
    let mut img = RgbaImage::from_pixel(10, 10, Rgba([200, 200, 200, 255]));
    img.put_pixel(5, 5, Rgba([180, 90, 60, 90]));

    let result = remove_background_from_image(&DynamicImage::ImageRgba8(img), &png_config())?;
    let bytes = result.to_bytes(OutputFormat::Png, 90)?;
    let decoded = ImageIOService::load_from_bytes(&bytes)?;

    assert!(decoded.color().has_alpha());
    let rgba = decoded.to_rgba8();
    assert_eq!(rgba.get_pixel(5, 5).0, [180, 90, 60, 90]);
    assert_eq!(rgba.get_pixel(0, 0).0, [255, 255, 255, 255]);

    // JPEG drops alpha
    let jpeg = ImageIOService::load_from_bytes(&result.to_bytes(OutputFormat::Jpeg, 90)?)?;
    assert!(!jpeg.color().has_alpha());
    Ok(())
}

#[test]
fn test_bytes_workflow_with_custom_target() -> Result<()> {
    let source = ImageIOService::encode_to_vec(&portrait(12, 12), OutputFormat::Png, 90)?;
    let config = RemovalConfig::builder()
        .target_color(Rgb::new(0, 0, 255))
        .detector(DetectorPolicy::Saturation)
        .build()?;

    let result = remove_background_from_bytes(&source, &config)?;
    let rgb = result.image.to_rgb8();
    assert_eq!(rgb.get_pixel(11, 0).0, [0, 0, 255]);
    assert_eq!(rgb.get_pixel(6, 6).0, [180, 90, 60]);
    assert_eq!(result.stats.background, Rgb::new(200, 200, 200));
    Ok(())
}

#[tokio::test]
async fn test_reader_workflow() -> Result<()> {
    let source = ImageIOService::encode_to_vec(&portrait(12, 12), OutputFormat::Png, 90)?;
    let reader = std::io::Cursor::new(source);

    let result = remove_background_from_reader(reader, &RemovalConfig::default()).await?;
    assert_eq!(result.dimensions(), (12, 12));
    assert_eq!(result.stats.removed(), 12 * 12 - 16);

    let broken = std::io::Cursor::new(b"not an image".to_vec());
    assert!(remove_background_from_reader(broken, &RemovalConfig::default())
        .await
        .is_err());
    Ok(())
}

#[test]
fn test_progress_stages_in_order() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("portrait.png");
    ImageIOService::save_image(&portrait(10, 10), &input, OutputFormat::Png, 90)?;

    let reporter = RecordingReporter::default();
    let mut processor = BackgroundRemovalProcessor::new(png_config())?
        .with_progress(ProgressTracker::new(Box::new(reporter.clone())));
    processor.process_file_to_output(&input, None)?;

    assert_eq!(
        *reporter.stages.lock().unwrap(),
        vec![
            ProcessingStage::ImageLoading,
            ProcessingStage::PixelPreparation,
            ProcessingStage::BackgroundReplacement,
            ProcessingStage::FileSaving,
            ProcessingStage::Completed,
        ]
    );
    assert_eq!(*reporter.completions.lock().unwrap(), 1);
    assert!(reporter.errors.lock().unwrap().is_empty());

    assert!(processor.process_file(dir.path().join("missing.png")).is_err());
    assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    assert_eq!(*reporter.completions.lock().unwrap(), 1);
    Ok(())
}

#[test]
fn test_config_file_drives_processing() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("whitebg.json");
    std::fs::write(
        &config_path,
        r##"{
            "threshold": 70.0,
            "detector": "saturation",
            "target_color": {"r": 240, "g": 240, "b": 240},
            "output_format": "png",
            "quality": 80
        }"##,
    )
    .unwrap();

    let config = RemovalConfig::from_json_file(&config_path)?;
    assert_eq!(config.detector, DetectorPolicy::Saturation);
    assert_eq!(
        OutputFormatHandler::output_file_name("a/b/photo.jpeg", &config),
        "white_T70_Q80_photo.png"
    );

    let result = remove_background_from_image(&portrait(10, 10), &config)?;
    assert_eq!(result.image.to_rgb8().get_pixel(0, 0).0, [240, 240, 240]);

    // the serialized form loads back to the same configuration
    let saved = dir.path().join("saved.json");
    std::fs::write(&saved, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    assert_eq!(RemovalConfig::from_json_file(&saved)?, config);
    Ok(())
}

#[test]
fn test_processor_reused_across_files() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let mut processor = BackgroundRemovalProcessor::new(png_config())?;

    for (name, size) in [("a.png", 8), ("b.png", 14), ("c.png", 20)] {
        let input = dir.path().join(name);
        ImageIOService::save_image(&portrait(size, size), &input, OutputFormat::Png, 90)?;
        let (result, output) = processor.process_file_to_output(&input, None)?;
        assert!(output.exists());
        assert_eq!(result.stats.removed(), (size * size) as usize - 16);
        assert_eq!(result.input_path.as_deref(), Some(input.as_path()));
    }
    Ok(())
}
