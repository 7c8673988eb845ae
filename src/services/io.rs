//! Image I/O operations service
//!
//! Keeps file and codec handling out of the pipeline, which only ever sees
//! raw interleaved samples.

use crate::{
    config::OutputFormat,
    error::{BgRemovalError, Result},
    services::OutputFormatHandler,
};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::{io::Cursor, path::Path};

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Falls back to content sniffing when the extension does not match the
    /// actual encoding.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use whitebg::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("portrait.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(BgRemovalError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    BgRemovalError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    let extension = path_ref
                        .extension()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown");

                    BgRemovalError::processing_stage_error(
                        "image loading",
                        &format!(
                            "Could not decode as .{} ({}) or by content ({})",
                            extension, e, content_err
                        ),
                        Some(&format!("path: {}, size: {} bytes", path_ref.display(), data.len())),
                    )
                })
            },
        }
    }

    /// Decode an in-memory image
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            BgRemovalError::processing(format!("Failed to decode image from bytes: {}", e))
        })
    }

    /// Read an async stream to the end and decode it
    ///
    /// # Examples
    /// ```rust,no_run
    /// use whitebg::services::ImageIOService;
    /// use tokio::fs::File;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let file = File::open("portrait.jpg").await?;
    /// let image = ImageIOService::load_from_reader(file).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from_reader<R: tokio::io::AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<DynamicImage> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.map_err(|e| {
            BgRemovalError::processing(format!("Failed to read from stream: {}", e))
        })?;

        Self::load_from_bytes(&buffer)
    }

    /// Encode `image` into memory.
    ///
    /// JPEG output drops any alpha channel and honors `quality`; PNG is
    /// lossless and ignores it.
    pub fn encode_to_vec(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        match format {
            OutputFormat::Jpeg => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut cursor, quality)
                    .encode_image(&rgb)
                    .map_err(|e| BgRemovalError::processing(format!("Failed to encode JPEG: {}", e)))?;
            },
            OutputFormat::Png => {
                image
                    .write_to(&mut cursor, ImageFormat::Png)
                    .map_err(|e| BgRemovalError::processing(format!("Failed to encode PNG: {}", e)))?;
            },
        }

        Ok(buffer)
    }

    /// Encode and write `image`, creating parent directories as needed
    ///
    /// # Examples
    /// ```rust,no_run
    /// use whitebg::{services::ImageIOService, OutputFormat};
    /// use image::DynamicImage;
    ///
    /// # let image = DynamicImage::new_rgb8(100, 100);
    /// ImageIOService::save_image(&image, "out/white_portrait.jpg", OutputFormat::Jpeg, 90)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                BgRemovalError::file_io_error("create output directory", parent, &e)
            })?;
        }

        let prepared = OutputFormatHandler::prepare_for_format(image, format);
        let bytes = Self::encode_to_vec(&prepared, format, quality).map_err(|e| {
            BgRemovalError::processing_stage_error(
                "image save",
                &e.to_string(),
                Some(&format!("format: {:?}, path: {}", format, path_ref.display())),
            )
        })?;

        std::fs::write(path_ref, &bytes)
            .map_err(|e| BgRemovalError::file_io_error("write output image", path_ref, &e))?;

        log::debug!("Wrote {} bytes to {}", bytes.len(), path_ref.display());
        Ok(())
    }

    /// Check if a file path has a decodable image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png"))
    }
}
