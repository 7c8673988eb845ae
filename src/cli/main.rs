//! whitebg command line tool
//!
//! Replaces the background of portrait photos, one file or a whole
//! directory at a time.

use super::config::CliConfigBuilder;
use crate::{
    processor::BackgroundRemovalProcessor,
    services::{ImageIOService, ProgressTracker},
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Replace near-uniform photo backgrounds with a solid color
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "whitebg")]
pub struct Cli {
    /// Input images or directories (use "-" for stdin)
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch processing). Use "-" for stdout.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Base color-distance threshold [default: 80]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Encoder quality, 1-100 [default: 90]
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Output format [default: jpeg]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Prefix for generated output file names [default: white_]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Subject detection policy [default: uniformity]
    #[arg(short, long, value_enum)]
    pub detector: Option<CliDetector>,

    /// Minimum saturation for a pixel to count as subject
    #[arg(long)]
    pub min_saturation: Option<u8>,

    /// Maximum neighborhood variance still considered a flat region
    #[arg(long)]
    pub max_variance: Option<u32>,

    /// Replacement color as hex (#RRGGBB) or "r,g,b" [default: white]
    #[arg(long, value_name = "COLOR")]
    pub target_color: Option<String>,

    /// Edge erosion passes
    #[arg(long)]
    pub erosion_passes: Option<u32>,

    /// JSON configuration file; explicit flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for batch processing (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output style
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Jpeg,
    Png,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliDetector {
    /// Saturated, reasonably bright pixels are subject
    Saturation,
    /// Saturated pixels are subject unless their neighborhood is flat
    Uniformity,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

/// Outcome counts for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Where a processed image is written
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputTarget {
    Stdout,
    /// Exact file path given with `-o`
    File(PathBuf),
    /// Generated name inside this directory
    Directory(PathBuf),
    /// Generated name next to the input
    BesideInput,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    let detector_name = config.detector.to_string();
    let _session = spans::session(&session_id, &detector_name).entered();
    info!("Input(s): {}", cli.input.join(", "));
    info!(
        "Threshold: {}, detector: {}, output: {:?} (quality {})",
        config.threshold,
        detector_name,
        config.output_format,
        config.quality
    );

    let mut processor = BackgroundRemovalProcessor::new(config)
        .context("Failed to create background removal processor")?;
    if cli.verbose > 0 {
        processor = processor.with_progress(ProgressTracker::console(cli.verbose > 1));
    }

    let start_time = Instant::now();
    let summary = process_inputs(&cli, &mut processor)?;
    events::performance_metric("session", start_time.elapsed().as_millis() as u64);

    info!(
        "Processed {} image(s), {} failed, in {:.2}s",
        summary.processed,
        summary.failed,
        start_time.elapsed().as_secs_f64()
    );

    if summary.processed == 0 && summary.failed > 0 {
        anyhow::bail!("All {} input(s) failed", summary.failed);
    }
    Ok(())
}

fn process_inputs(cli: &Cli, processor: &mut BackgroundRemovalProcessor) -> Result<BatchSummary> {
    if cli.input.len() == 1 && cli.input[0] == "-" {
        process_stdin(cli, processor)?;
        return Ok(BatchSummary {
            processed: 1,
            failed: 0,
        });
    }

    let files = collect_input_files(cli, &processor.config().output_prefix)?;
    if files.is_empty() {
        warn!("No supported image files found (JPEG and PNG are accepted)");
        return Ok(BatchSummary::default());
    }

    let target = resolve_output_target(cli.output.as_deref(), files.len())?;
    if let OutputTarget::Directory(dir) = &target {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let _batch = spans::batch_processing(files.len()).entered();
    let progress_bar = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut summary = BatchSummary::default();
    for input_file in &files {
        if let Some(pb) = &progress_bar {
            pb.set_message(display_name(input_file));
        }

        let _file = spans::file_processing(input_file).entered();
        match process_single_file(processor, input_file, &target) {
            Ok(written) => {
                summary.processed += 1;
                if let Some(path) = written {
                    info!("{} -> {}", input_file.display(), path.display());
                }
            },
            Err(e) => {
                summary.failed += 1;
                events::error_with_context(&*e, &input_file.display().to_string());
            },
        }

        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "{} processed, {} failed",
            summary.processed, summary.failed
        ));
    }

    Ok(summary)
}

/// Process one file; returns the written path, or `None` for stdout
fn process_single_file(
    processor: &mut BackgroundRemovalProcessor,
    input: &Path,
    target: &OutputTarget,
) -> Result<Option<PathBuf>> {
    let (format, quality) = {
        let config = processor.config();
        (config.output_format, config.quality)
    };

    match target {
        OutputTarget::Stdout => {
            let result = processor.process_file(input)?;
            write_stdout(&result.to_bytes(format, quality)?)?;
            Ok(None)
        },
        OutputTarget::File(path) => {
            let mut result = processor.process_file(input)?;
            result
                .save(path, format, quality)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            Ok(Some(path.clone()))
        },
        OutputTarget::Directory(dir) => {
            let (_, written) = processor.process_file_to_output(input, Some(dir))?;
            Ok(Some(written))
        },
        OutputTarget::BesideInput => {
            let (_, written) = processor.process_file_to_output(input, None)?;
            Ok(Some(written))
        },
    }
}

fn process_stdin(cli: &Cli, processor: &mut BackgroundRemovalProcessor) -> Result<()> {
    let bytes = read_stdin()?;
    let detected = detect_image_format(&bytes)
        .context("Unrecognized image data on stdin (expected JPEG or PNG)")?;
    info!("Read {} bytes of {} from stdin", bytes.len(), detected);

    let (format, quality) = {
        let config = processor.config();
        (config.output_format, config.quality)
    };
    let mut result = processor.process_bytes(&bytes)?;

    match cli.output.as_deref() {
        None | Some("-") => write_stdout(&result.to_bytes(format, quality)?),
        Some(path) => {
            result
                .save(path, format, quality)
                .with_context(|| format!("Failed to save {}", path))?;
            info!("Saved {}", path);
            Ok(())
        },
    }
}

/// Expand files and directories into a sorted, de-duplicated list.
///
/// Directory scans skip earlier results carrying `output_prefix`; files
/// named explicitly are always kept.
fn collect_input_files(cli: &Cli, output_prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in &cli.input {
        let path = Path::new(input);
        if path.is_file() {
            if is_image_file(path) {
                files.push(path.to_path_buf());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let found =
                find_image_files(path, cli.recursive, cli.pattern.as_deref(), output_prefix)?;
            if found.is_empty() {
                warn!("No matching images in {}", path.display());
            }
            files.extend(found);
        } else {
            anyhow::bail!("Input does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn resolve_output_target(output: Option<&str>, file_count: usize) -> Result<OutputTarget> {
    match output {
        None => Ok(OutputTarget::BesideInput),
        Some("-") if file_count == 1 => Ok(OutputTarget::Stdout),
        Some("-") => anyhow::bail!("Output to stdout requires exactly one input"),
        Some(path) => {
            let path = PathBuf::from(path);
            if file_count > 1 || path.is_dir() {
                Ok(OutputTarget::Directory(path))
            } else {
                Ok(OutputTarget::File(path))
            }
        },
    }
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;
    if buffer.is_empty() {
        anyhow::bail!("No data received on stdin");
    }
    Ok(buffer)
}

/// Identify the container from its magic bytes
fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else {
        None
    }
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(data).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn find_image_files(
    dir: &Path,
    recursive: bool,
    pattern: Option<&str>,
    output_prefix: &str,
) -> Result<Vec<PathBuf>> {
    let pattern = pattern
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid file pattern")?;
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir).follow_links(false) {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && is_image_file(path)
                && matches_pattern(path, pattern.as_ref())
                && !is_generated_output(path, output_prefix)
            {
                files.push(path.to_path_buf());
            }
        }
    } else {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && is_image_file(&path)
                && matches_pattern(&path, pattern.as_ref())
                && !is_generated_output(&path, output_prefix)
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    ImageIOService::is_supported_format(path)
}

fn matches_pattern(path: &Path, pattern: Option<&glob::Pattern>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name))
}

fn is_generated_output(path: &Path, output_prefix: &str) -> bool {
    !output_prefix.is_empty()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(output_prefix))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
