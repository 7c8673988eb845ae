//! FIFO of grid locations for the breadth-first flood fill

use crate::error::{BgRemovalError, Result};
use std::collections::VecDeque;

/// A grid location, `x` across and `y` down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: usize,
    pub y: usize,
}

impl GridPoint {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// In-bounds 4-connected neighbors: up, down, left, right
    pub fn neighbors4(self, width: usize, height: usize) -> impl Iterator<Item = GridPoint> {
        const OFFSETS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        OFFSETS.into_iter().filter_map(move |(dx, dy)| {
            let x = self.x.checked_add_signed(dx)?;
            let y = self.y.checked_add_signed(dy)?;
            (x < width && y < height).then_some(GridPoint { x, y })
        })
    }
}

/// Growable FIFO; growth goes through `try_reserve` so exhaustion surfaces
/// as an error instead of an abort.
#[derive(Debug, Default)]
pub struct TraversalQueue {
    points: VecDeque<GridPoint>,
}

impl TraversalQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-reserve room for `capacity` locations
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut points = VecDeque::new();
        points
            .try_reserve(capacity)
            .map_err(|_| BgRemovalError::allocation("flood fill queue", capacity))?;
        Ok(Self { points })
    }

    pub fn enqueue(&mut self, point: GridPoint) -> Result<()> {
        self.points
            .try_reserve(1)
            .map_err(|_| BgRemovalError::allocation("flood fill queue", self.points.len() + 1))?;
        self.points.push_back(point);
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<GridPoint> {
        self.points.pop_front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Drop all entries and release the backing storage
    pub fn clear(&mut self) {
        self.points.clear();
        self.points.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = TraversalQueue::new();
        queue.enqueue(GridPoint::new(0, 0)).unwrap();
        queue.enqueue(GridPoint::new(3, 0)).unwrap();
        queue.enqueue(GridPoint::new(0, 3)).unwrap();
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.dequeue(), Some(GridPoint::new(0, 0)));
        assert_eq!(queue.dequeue(), Some(GridPoint::new(3, 0)));
        assert_eq!(queue.dequeue(), Some(GridPoint::new(0, 3)));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut queue = TraversalQueue::with_capacity(2).unwrap();
        for i in 0..1000 {
            queue.enqueue(GridPoint::new(i, i)).unwrap();
        }
        assert_eq!(queue.len(), 1000);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_neighbors4_respects_bounds() {
        let corner: Vec<_> = GridPoint::new(0, 0).neighbors4(3, 3).collect();
        assert_eq!(corner, vec![GridPoint::new(0, 1), GridPoint::new(1, 0)]);

        let center: Vec<_> = GridPoint::new(1, 1).neighbors4(3, 3).collect();
        assert_eq!(
            center,
            vec![
                GridPoint::new(1, 0),
                GridPoint::new(1, 2),
                GridPoint::new(0, 1),
                GridPoint::new(2, 1),
            ]
        );

        assert_eq!(GridPoint::new(0, 0).neighbors4(1, 1).count(), 0);
    }
}
