//! Collision primitives for a round avatar against square tiles
//!
//! The only shape pair the game needs: a circle against an axis-aligned
//! box. The closest point on the box is found by clamping each axis, so a
//! circle near a corner is tested against the corner itself rather than the
//! box's extended faces.

use glam::Vec2;

/// Axis-aligned box given by its min and max corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Square box with its top-left corner at `min`
    pub fn square(min: Vec2, size: f32) -> Self {
        Self {
            min,
            max: min + Vec2::splat(size),
        }
    }

    /// Closest point on (or in) the box to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }
}

/// Whether a circle overlaps a box. Touching exactly is not overlap.
#[inline]
pub fn circle_overlaps_aabb(center: Vec2, radius: f32, aabb: &Aabb) -> bool {
    let closest = aabb.closest_point(center);
    center.distance_squared(closest) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::square(Vec2::new(10.0, 10.0), 10.0)
    }

    #[test]
    fn test_closest_point_clamps_per_axis() {
        let b = unit_box();
        assert_eq!(b.closest_point(Vec2::new(0.0, 15.0)), Vec2::new(10.0, 15.0));
        assert_eq!(b.closest_point(Vec2::new(25.0, 25.0)), Vec2::new(20.0, 20.0));
        // Inside: the point itself
        assert_eq!(b.closest_point(Vec2::new(12.0, 13.0)), Vec2::new(12.0, 13.0));
    }

    #[test]
    fn test_face_overlap() {
        let b = unit_box();
        assert!(circle_overlaps_aabb(Vec2::new(8.0, 15.0), 3.0, &b));
        assert!(!circle_overlaps_aabb(Vec2::new(6.0, 15.0), 3.0, &b));
        // Exactly touching
        assert!(!circle_overlaps_aabb(Vec2::new(7.0, 15.0), 3.0, &b));
    }

    #[test]
    fn test_corner_uses_true_distance() {
        let b = unit_box();
        // 2.5 px off both faces of the corner: within radius 3 on each axis
        // but sqrt(12.5) ≈ 3.54 away from the corner itself
        assert!(!circle_overlaps_aabb(Vec2::new(7.5, 7.5), 3.0, &b));
        assert!(circle_overlaps_aabb(Vec2::new(8.5, 8.5), 3.0, &b));
    }
}
