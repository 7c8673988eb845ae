//! Reclaim enclosed background pockets the flood fill could not reach

use super::{visitation::VisitationMap, PhaseContext};
use crate::types::PixelBuffer;

/// Raster scan over unvisited pixels. A non-subject pixel closer than
/// `threshold * island_factor` to the background reference is painted and
/// marked. Returns the number of pixels reclaimed.
pub fn remove_islands(
    buffer: &mut PixelBuffer<'_>,
    visited: &mut VisitationMap,
    ctx: &PhaseContext,
) -> usize {
    let limit = ctx.threshold * ctx.island_factor;
    let mut reclaimed = 0;

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            if visited.is_visited(x, y) || ctx.classifier.is_subject(x, y) {
                continue;
            }
            if buffer.rgb_at(x, y).distance(&ctx.background) < limit {
                buffer.paint(x, y, ctx.target);
                visited.mark(x, y);
                reclaimed += 1;
            }
        }
    }

    reclaimed
}
