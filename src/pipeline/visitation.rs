//! Per-pixel "classified as background" flags shared by all phases

use super::queue::GridPoint;
use crate::error::{BgRemovalError, Result};

/// One flag per pixel, all clear at creation.
///
/// Flags only ever go from unvisited to visited. A visited pixel has been
/// painted with the fill color.
#[derive(Debug)]
pub struct VisitationMap {
    flags: Vec<bool>,
    width: usize,
    height: usize,
    visited: usize,
}

impl VisitationMap {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or_else(|| BgRemovalError::allocation("visitation map", usize::MAX))?;
        let mut flags = Vec::new();
        flags
            .try_reserve_exact(len)
            .map_err(|_| BgRemovalError::allocation("visitation map", len))?;
        flags.resize(len, false);

        Ok(Self {
            flags,
            width,
            height,
            visited: 0,
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
    pub fn is_visited(&self, x: usize, y: usize) -> bool {
        self.flags[y * self.width + x]
    }

    /// Returns `true` when the flag was newly set
    pub fn mark(&mut self, x: usize, y: usize) -> bool {
        let flag = &mut self.flags[y * self.width + x];
        if *flag {
            return false;
        }
        *flag = true;
        self.visited += 1;
        true
    }

    /// Whether any 4-connected neighbor of `(x, y)` is visited
    #[must_use]
    pub fn has_visited_neighbor(&self, x: usize, y: usize) -> bool {
        GridPoint::new(x, y)
            .neighbors4(self.width, self.height)
            .any(|n| self.is_visited(n.x, n.y))
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited
    }
}
