//! Corner-seeded breadth-first flood fill
//!
//! Grows the background region inward from the four image corners. A
//! location joins the region when its distance to the background reference
//! is below the effective threshold; inside the safe zone that threshold is
//! tightened and subject pixels are never admitted.

use super::{
    queue::{GridPoint, TraversalQueue},
    visitation::VisitationMap,
    PhaseContext,
};
use crate::{error::Result, types::PixelBuffer};
use tracing::trace;

/// Seeds in top-left, top-right, bottom-left, bottom-right order; a corner
/// shared by a 1-pixel-wide or 1-pixel-tall image is seeded once.
fn corner_seeds(width: usize, height: usize) -> [GridPoint; 4] {
    [
        GridPoint::new(0, 0),
        GridPoint::new(width - 1, 0),
        GridPoint::new(0, height - 1),
        GridPoint::new(width - 1, height - 1),
    ]
}

/// Run the flood fill and return the number of pixels painted.
///
/// Every dequeued location is painted with the fill color. Seeds are
/// admitted unconditionally.
pub fn flood_fill(
    buffer: &mut PixelBuffer<'_>,
    visited: &mut VisitationMap,
    ctx: &PhaseContext,
) -> Result<usize> {
    let (width, height) = (buffer.width(), buffer.height());
    let mut queue = TraversalQueue::with_capacity(width.saturating_add(height).saturating_mul(2))?;

    for seed in corner_seeds(width, height) {
        if visited.mark(seed.x, seed.y) {
            queue.enqueue(seed)?;
        }
    }

    let shielded_threshold = ctx.threshold * ctx.safe_zone_factor;
    let mut painted = 0usize;

    while let Some(point) = queue.dequeue() {
        buffer.paint(point.x, point.y, ctx.target);
        painted += 1;

        for next in point.neighbors4(width, height) {
            if visited.is_visited(next.x, next.y) {
                continue;
            }

            let in_zone = ctx.safe_zone.contains(next.x, next.y);
            if in_zone && ctx.classifier.is_subject(next.x, next.y) {
                continue;
            }

            let effective = if in_zone {
                shielded_threshold
            } else {
                ctx.threshold
            };
            let distance = buffer.rgb_at(next.x, next.y).distance(&ctx.background);
            if distance < effective {
                visited.mark(next.x, next.y);
                queue.enqueue(next)?;
            }
        }
    }

    trace!(painted, "flood fill drained");
    queue.clear();
    Ok(painted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RemovalConfig,
        pipeline::detector::{PixelContext, SubjectDetector},
        types::Rgb,
    };

    struct NeverSubject;

    impl SubjectDetector for NeverSubject {
        fn is_subject(&self, _ctx: &PixelContext<'_>) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "never"
        }
    }

    struct AlwaysSubject;

    impl SubjectDetector for AlwaysSubject {
        fn is_subject(&self, _ctx: &PixelContext<'_>) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "always"
        }
    }

    fn row_with_middle(middle: [u8; 3]) -> Vec<u8> {
        let mut data = [100u8, 100, 100].repeat(5);
        data[6..9].copy_from_slice(&middle);
        data
    }

    fn fill_with(
        data: &mut [u8],
        width: usize,
        height: usize,
        threshold: f64,
        detector: Box<dyn SubjectDetector>,
    ) -> (usize, VisitationMap) {
        let mut buffer = PixelBuffer::new(data, width, height, 3).unwrap();
        let config = RemovalConfig {
            threshold,
            ..RemovalConfig::default()
        };
        let ctx = PhaseContext::with_detector(&buffer, &config, detector).unwrap();
        let mut visited = VisitationMap::new(width, height).unwrap();
        let painted = flood_fill(&mut buffer, &mut visited, &ctx).unwrap();
        (painted, visited)
    }

    #[test]
    fn test_distance_equal_to_threshold_is_not_admitted() {
        // (130, 140, 100) is exactly 50 away from (100, 100, 100)
        let mut data = row_with_middle([130, 140, 100]);
        let (painted, visited) = fill_with(&mut data, 5, 1, 50.0, Box::new(NeverSubject));

        assert_eq!(painted, 4);
        assert!(!visited.is_visited(2, 0));
        assert_eq!(&data[6..9], &[130, 140, 100]);
        assert_eq!(&data[0..3], &[255, 255, 255]);
        assert_eq!(&data[12..15], &[255, 255, 255]);
    }

    #[test]
    fn test_distance_below_threshold_is_admitted() {
        let mut data = row_with_middle([100, 149, 100]);
        let (painted, visited) = fill_with(&mut data, 5, 1, 50.0, Box::new(NeverSubject));

        assert_eq!(painted, 5);
        assert_eq!(visited.visited_count(), 5);
        assert!(data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_corners_are_seeded_even_when_far_from_reference() {
        let mut data = [50u8, 50, 50].repeat(9);
        data[6..9].copy_from_slice(&[250, 10, 10]);
        let (_, visited) = fill_with(&mut data, 3, 3, 1.0, Box::new(NeverSubject));

        assert!(visited.is_visited(2, 0));
        assert_eq!(&data[6..9], &[255, 255, 255]);
    }

    #[test]
    fn test_single_column_seeds_each_corner_once() {
        let mut data = [10u8, 10, 10].repeat(4);
        let (painted, visited) = fill_with(&mut data, 1, 4, 5.0, Box::new(NeverSubject));
        assert_eq!(painted, 4);
        assert_eq!(visited.visited_count(), 4);
    }

    #[test]
    fn test_subject_in_safe_zone_blocks_growth() {
        // every pixel matches the reference, but the detector shields them all
        let mut data = [200u8, 200, 200].repeat(100);
        let (_, visited) = fill_with(&mut data, 10, 10, 1000.0, Box::new(AlwaysSubject));

        let zone = crate::pipeline::safe_zone::SafeZone::for_dimensions(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                if zone.contains(x, y) {
                    assert!(!visited.is_visited(x, y), "({}, {}) was filled", x, y);
                }
            }
        }
        assert!(visited.is_visited(0, 5));
        assert!(visited.is_visited(5, 0));
    }

    #[test]
    fn test_safe_zone_tightens_threshold() {
        // 10x10 grey, a pixel inside the zone at distance 30
        let mut data = [200u8, 200, 200].repeat(100);
        let idx = (5 * 10 + 5) * 3;
        data[idx..idx + 3].copy_from_slice(&[230, 200, 200]);
        let (_, visited) = fill_with(&mut data, 10, 10, 80.0, Box::new(NeverSubject));

        // 30 >= 80 * 0.35
        assert!(!visited.is_visited(5, 5));
        assert!(visited.is_visited(4, 5));
        assert_eq!(Rgb::new(data[idx], data[idx + 1], data[idx + 2]), Rgb::new(230, 200, 200));
    }
}
