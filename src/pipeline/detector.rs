//! Subject detection policies
//!
//! A detector decides whether a grid location plausibly belongs to the
//! photographed person (protected) or to the backdrop (removable). Two
//! policies share one trait so the mutating phases never care which one
//! is active:
//!
//! - [`SaturationDetector`]: channel spread plus a brightness floor. Skin,
//!   hair and clothing spread their channels apart; a backdrop keeps them
//!   close even under a global color cast.
//! - [`UniformityDetector`]: the same spread test, followed by a 3x3
//!   uniformity check so that a vivid but solid backdrop is still treated
//!   as background.

use crate::{
    config::{DetectorPolicy, RemovalConfig},
    error::{BgRemovalError, Result},
    types::{PixelBuffer, Rgb},
};

/// Pixels at or below this mean brightness are never protected by the
/// saturation-only policy; the uniformity policy rejects anything below it.
pub const BRIGHTNESS_FLOOR: u8 = 20;

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Read-only view of one grid location and its surroundings
#[derive(Debug, Clone, Copy)]
pub struct PixelContext<'a> {
    samples: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
    x: usize,
    y: usize,
}

impl<'a> PixelContext<'a> {
    /// `samples` must hold `width * height * channels` interleaved bytes
    #[must_use]
    pub fn new(
        samples: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
        x: usize,
        y: usize,
    ) -> Self {
        Self {
            samples,
            width,
            height,
            channels,
            x,
            y,
        }
    }

    #[must_use]
    pub fn x(&self) -> usize {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Color of the center pixel
    #[must_use]
    pub fn rgb(&self) -> Rgb {
        self.rgb_at(self.x, self.y)
    }

    fn rgb_at(&self, x: usize, y: usize) -> Rgb {
        let idx = (y * self.width + x) * self.channels;
        Rgb::new(self.samples[idx], self.samples[idx + 1], self.samples[idx + 2])
    }

    /// Colors of the in-bounds 8-connected neighbors
    pub fn neighbors(&self) -> impl Iterator<Item = Rgb> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = self.x.checked_add_signed(dx)?;
            let ny = self.y.checked_add_signed(dy)?;
            (nx < self.width && ny < self.height).then(|| self.rgb_at(nx, ny))
        })
    }
}

/// Classifies a location as subject (`true`) or background (`false`)
pub trait SubjectDetector: Send + Sync {
    fn is_subject(&self, ctx: &PixelContext<'_>) -> bool;

    /// Short policy name for logs
    fn name(&self) -> &'static str;
}

/// Pixel-local policy: spread at least `min_saturation`, brightness above the floor
#[derive(Debug, Clone, Copy)]
pub struct SaturationDetector {
    min_saturation: u8,
}

impl SaturationDetector {
    #[must_use]
    pub fn new(min_saturation: u8) -> Self {
        Self { min_saturation }
    }

    /// The same decision on a bare color, for callers without a grid
    #[must_use]
    pub fn is_subject_color(&self, color: Rgb) -> bool {
        color.saturation() >= self.min_saturation && color.brightness() > BRIGHTNESS_FLOOR
    }
}

impl SubjectDetector for SaturationDetector {
    fn is_subject(&self, ctx: &PixelContext<'_>) -> bool {
        self.is_subject_color(ctx.rgb())
    }

    fn name(&self) -> &'static str {
        "saturation"
    }
}

/// Neighborhood-aware policy: saturated and locally textured
#[derive(Debug, Clone, Copy)]
pub struct UniformityDetector {
    min_saturation: u8,
    max_variance: u32,
}

impl UniformityDetector {
    #[must_use]
    pub fn new(min_saturation: u8, max_variance: u32) -> Self {
        Self {
            min_saturation,
            max_variance,
        }
    }
}

impl SubjectDetector for UniformityDetector {
    fn is_subject(&self, ctx: &PixelContext<'_>) -> bool {
        let color = ctx.rgb();
        if color.brightness() < BRIGHTNESS_FLOOR {
            return false;
        }
        if color.saturation() < self.min_saturation {
            return false;
        }
        !is_uniform_region(ctx, self.max_variance)
    }

    fn name(&self) -> &'static str {
        "saturation-uniformity"
    }
}

/// Mean of `|dR| + |dG| + |dB|` between the center and each in-bounds
/// neighbor; `None` when the pixel has no neighbors at all.
#[must_use]
pub fn neighborhood_variance(ctx: &PixelContext<'_>) -> Option<f64> {
    let center = ctx.rgb();
    let (sum, count) = ctx
        .neighbors()
        .fold((0u32, 0u32), |(sum, count), n| (sum + center.manhattan(&n), count + 1));

    (count > 0).then(|| f64::from(sum) / f64::from(count))
}

/// A lone pixel (no neighbors) is not uniform.
#[must_use]
pub fn is_uniform_region(ctx: &PixelContext<'_>, max_variance: u32) -> bool {
    neighborhood_variance(ctx).is_some_and(|variance| variance <= f64::from(max_variance))
}

/// Build the detector selected by the configuration
#[must_use]
pub fn detector_for(config: &RemovalConfig) -> Box<dyn SubjectDetector> {
    match config.detector {
        DetectorPolicy::Saturation => Box::new(SaturationDetector::new(config.min_saturation)),
        DetectorPolicy::SaturationUniformity => Box::new(UniformityDetector::new(
            config.min_saturation,
            config.max_variance,
        )),
    }
}

/// The active detector bound to the pixels as they were when the run began.
///
/// Phases paint the live buffer while they work; neighborhood reads go to
/// this snapshot so a freshly painted neighbor never changes a verdict.
pub struct SubjectClassifier {
    detector: Box<dyn SubjectDetector>,
    snapshot: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl SubjectClassifier {
    pub fn new(detector: Box<dyn SubjectDetector>, buffer: &PixelBuffer<'_>) -> Result<Self> {
        let source = buffer.as_bytes();
        let mut snapshot = Vec::new();
        snapshot
            .try_reserve_exact(source.len())
            .map_err(|_| BgRemovalError::allocation("detector snapshot", source.len()))?;
        snapshot.extend_from_slice(source);

        Ok(Self {
            detector,
            snapshot,
            width: buffer.width(),
            height: buffer.height(),
            channels: buffer.layout().count(),
        })
    }

    #[must_use]
    pub fn is_subject(&self, x: usize, y: usize) -> bool {
        let ctx = PixelContext::new(
            &self.snapshot,
            self.width,
            self.height,
            self.channels,
            x,
            y,
        );
        self.detector.is_subject(&ctx)
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.detector.name()
    }
}
