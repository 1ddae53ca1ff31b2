//! Axis-aligned rectangle geometry
//!
//! Every spatial entity (house, targets, obstacles, player) is a `Rect`.
//! Placement uses padded overlap tests; proximity uses center distances.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow the rectangle by `padding` on every side
    pub fn expanded(&self, padding: f32) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + 2.0 * padding,
            height: self.height + 2.0 * padding,
        }
    }

    /// Overlap test with a clearance band.
    ///
    /// The two rectangles count as overlapping unless at least `padding`
    /// separates them along one axis. Touching edges overlap at zero padding.
    pub fn overlaps(&self, other: &Rect, padding: f32) -> bool {
        !(self.right() + padding < other.x
            || other.right() + padding < self.x
            || self.bottom() + padding < other.y
            || other.bottom() + padding < self.y)
    }

    /// Center-to-center Euclidean distance
    #[inline]
    pub fn center_distance(&self, other: &Rect) -> f32 {
        self.center().distance(other.center())
    }

    /// Whether the rectangle lies fully inside `[min, max]` on both axes
    pub fn within(&self, min: Vec2, max: Vec2) -> bool {
        self.x >= min.x && self.y >= min.y && self.right() <= max.x && self.bottom() <= max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_padding() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(15.0, 0.0, 10.0, 10.0);

        // 5 units apart: clear without padding, overlapping once the band exceeds the gap
        assert!(!a.overlaps(&b, 0.0));
        assert!(!a.overlaps(&b, 4.9));
        assert!(a.overlaps(&b, 5.0));
        assert!(a.overlaps(&b, 20.0));
        // Symmetric
        assert_eq!(a.overlaps(&b, 3.0), b.overlaps(&a, 3.0));
    }

    #[test]
    fn test_touching_edges_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&b, 0.0));
    }

    #[test]
    fn test_expanded_and_center() {
        let r = Rect::new(100.0, 200.0, 64.0, 96.0);
        let e = r.expanded(150.0);
        assert_eq!(e, Rect::new(-50.0, 50.0, 364.0, 396.0));
        assert_eq!(r.center(), e.center());
    }

    #[test]
    fn test_center_distance() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(30.0, 40.0, 10.0, 10.0);
        assert!((a.center_distance(&b) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_within() {
        let r = Rect::new(150.0, 150.0, 80.0, 80.0);
        assert!(r.within(Vec2::splat(150.0), Vec2::new(1770.0, 930.0)));
        assert!(!r.within(Vec2::splat(151.0), Vec2::new(1770.0, 930.0)));
    }
}
