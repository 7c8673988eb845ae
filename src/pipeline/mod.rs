//! The three-phase background replacement pipeline
//!
//! 1. [`flood_fill`]: corner-seeded breadth-first fill
//! 2. [`islands`]: raster scan for enclosed pockets
//! 3. [`erosion`]: boundary erosion of the remaining fringe
//!
//! Phases run strictly in that order over one shared [`VisitationMap`].
//! All working memory is released when [`run`] returns, on success and
//! on failure.

pub mod detector;
pub mod erosion;
pub mod flood_fill;
pub mod islands;
pub mod queue;
pub mod safe_zone;
pub mod visitation;

use crate::{
    config::RemovalConfig,
    error::Result,
    types::{PixelBuffer, RemovalStats, Rgb},
};
use detector::{detector_for, SubjectClassifier, SubjectDetector};
use instant::Instant;
use safe_zone::SafeZone;
use tracing::{debug, info_span};
use visitation::VisitationMap;

/// Values shared by all phases of one run
pub struct PhaseContext {
    /// Color sampled from pixel (0, 0) before anything was painted
    pub background: Rgb,
    pub target: Rgb,
    pub threshold: f64,
    pub safe_zone_factor: f64,
    pub island_factor: f64,
    pub erosion_factor: f64,
    pub erosion_passes: u32,
    pub safe_zone: SafeZone,
    pub classifier: SubjectClassifier,
}

impl PhaseContext {
    /// Bind the configured detector to the buffer's current contents
    pub fn new(buffer: &PixelBuffer<'_>, config: &RemovalConfig) -> Result<Self> {
        Self::with_detector(buffer, config, detector_for(config))
    }

    /// Same as [`PhaseContext::new`] with a caller-supplied detector
    pub fn with_detector(
        buffer: &PixelBuffer<'_>,
        config: &RemovalConfig,
        detector: Box<dyn SubjectDetector>,
    ) -> Result<Self> {
        Ok(Self {
            background: buffer.rgb_at(0, 0),
            target: config.target_color,
            threshold: config.threshold,
            safe_zone_factor: config.safe_zone_factor,
            island_factor: config.island_factor,
            erosion_factor: config.erosion_factor,
            erosion_passes: config.erosion_passes,
            safe_zone: SafeZone::for_dimensions(buffer.width(), buffer.height()),
            classifier: SubjectClassifier::new(detector, buffer)?,
        })
    }
}

/// Replace the background of `buffer` in place.
///
/// The configuration is validated first; on any error before the first
/// phase starts the buffer is untouched.
pub fn run(buffer: &mut PixelBuffer<'_>, config: &RemovalConfig) -> Result<RemovalStats> {
    run_with_detector(buffer, config, detector_for(config))
}

/// [`run`] with a caller-supplied subject detector
pub fn run_with_detector(
    buffer: &mut PixelBuffer<'_>,
    config: &RemovalConfig,
    detector: Box<dyn SubjectDetector>,
) -> Result<RemovalStats> {
    config.validate()?;

    let span = info_span!(
        "background_replacement",
        width = buffer.width(),
        height = buffer.height(),
        threshold = config.threshold,
        detector = detector.name(),
    );
    let _guard = span.enter();

    let mut visited = VisitationMap::new(buffer.width(), buffer.height())?;
    let ctx = PhaseContext::with_detector(buffer, config, detector)?;
    let mut stats = RemovalStats::new(buffer.pixel_count(), ctx.background);
    debug!(background = %ctx.background, target = %ctx.target, "background reference sampled");

    let start = Instant::now();
    stats.flood_filled = flood_fill::flood_fill(buffer, &mut visited, &ctx)?;
    stats.timings.flood_fill_ms = start.elapsed().as_millis() as u64;
    debug!(painted = stats.flood_filled, "flood fill complete");

    let start = Instant::now();
    stats.islands_removed = islands::remove_islands(buffer, &mut visited, &ctx);
    stats.timings.island_removal_ms = start.elapsed().as_millis() as u64;
    debug!(reclaimed = stats.islands_removed, "island removal complete");

    let start = Instant::now();
    stats.eroded = erosion::erode_edges(buffer, &mut visited, &ctx)?;
    stats.timings.edge_erosion_ms = start.elapsed().as_millis() as u64;
    debug!(eroded = stats.eroded, "edge erosion complete");

    debug!(
        removed = stats.removed(),
        total = stats.total_pixels,
        visited = visited.visited_count(),
        "background replacement finished"
    );
    Ok(stats)
}
