//! The central region where the subject is expected
//!
//! Portraits put the person in the middle of the frame, from a little below
//! the top edge down to the bottom. Inside this region the flood fill uses a
//! tighter threshold and never crosses subject pixels.

const LEFT_FRACTION: f64 = 0.20;
const RIGHT_FRACTION: f64 = 0.80;
const TOP_FRACTION: f64 = 0.15;

/// Central band `[0.20w, 0.80w]` across, from `0.15h` down to the bottom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeZone {
    x_min: f64,
    x_max: f64,
    y_min: f64,
}

impl SafeZone {
    #[must_use]
    pub fn for_dimensions(width: usize, height: usize) -> Self {
        let w = width as f64;
        let h = height as f64;
        Self {
            x_min: LEFT_FRACTION * w,
            x_max: RIGHT_FRACTION * w,
            y_min: TOP_FRACTION * h,
        }
    }

    /// Bounds are inclusive
    #[must_use]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as f64, y as f64);
        x >= self.x_min && x <= self.x_max && y >= self.y_min
    }
}
