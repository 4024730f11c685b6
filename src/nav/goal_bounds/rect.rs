use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle on the XZ plane (`Vec2::x` = world x, `Vec2::y` = world z).
///
/// [`BoundingRect::EMPTY`] has `min > max` and contains nothing; including
/// anything into it yields that thing's extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for BoundingRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingRect {
    pub const EMPTY: Self = Self {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Inclusive on all four sides.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn include(&mut self, min: Vec2, max: Vec2) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_contains_nothing_until_grown() {
        let mut rect = BoundingRect::EMPTY;
        assert!(rect.is_empty());
        assert!(!rect.contains(Vec2::ZERO));
        assert_eq!(rect.width(), 0.0);

        rect.include(Vec2::new(1.0, 2.0), Vec2::new(3.0, 2.5));
        rect.include(Vec2::new(-1.0, 2.2), Vec2::new(0.0, 4.0));
        assert_eq!(rect, BoundingRect::new(Vec2::new(-1.0, 2.0), Vec2::new(3.0, 4.0)));
        assert!(rect.contains(Vec2::new(3.0, 4.0)), "max corner is inside");
        assert!(!rect.contains(Vec2::new(3.01, 3.0)));
    }
}
