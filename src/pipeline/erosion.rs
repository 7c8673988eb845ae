//! Boundary erosion of residual fringe pixels

use super::{queue::GridPoint, visitation::VisitationMap, PhaseContext};
use crate::{
    error::{BgRemovalError, Result},
    types::PixelBuffer,
};
use tracing::trace;

/// Shrink the unvisited region by up to `erosion_passes` layers.
///
/// Each pass first collects every qualifying pixel (unvisited, touching a
/// visited 4-neighbor, not subject, closer than `threshold * erosion_factor`
/// to the reference) and only then paints and marks them, so a pixel
/// removed in this pass never qualifies another one in the same pass.
/// Returns the total number of pixels removed.
pub fn erode_edges(
    buffer: &mut PixelBuffer<'_>,
    visited: &mut VisitationMap,
    ctx: &PhaseContext,
) -> Result<usize> {
    let limit = ctx.threshold * ctx.erosion_factor;
    let mut pending: Vec<GridPoint> = Vec::new();
    let mut eroded = 0;

    for pass in 0..ctx.erosion_passes {
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                if visited.is_visited(x, y) || !visited.has_visited_neighbor(x, y) {
                    continue;
                }
                if ctx.classifier.is_subject(x, y) {
                    continue;
                }
                if buffer.rgb_at(x, y).distance(&ctx.background) < limit {
                    pending
                        .try_reserve(1)
                        .map_err(|_| BgRemovalError::allocation("erosion scratch", pending.len() + 1))?;
                    pending.push(GridPoint::new(x, y));
                }
            }
        }

        trace!(pass, marked = pending.len(), "erosion pass");
        if pending.is_empty() {
            break;
        }

        for point in pending.drain(..) {
            buffer.paint(point.x, point.y, ctx.target);
            visited.mark(point.x, point.y);
            eroded += 1;
        }
    }

    Ok(eroded)
}
