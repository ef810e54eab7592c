// Axis-aligned bounding boxes and the collision gate.
//
// The gate answers one question per frame: "would the character's extent,
// moved by the candidate displacement, overlap any obstacle extent?"
// Obstacle extents are recomputed fresh on every query — nothing is cached.

use glam::Vec3;

// ============================================================================
// AABB
// ============================================================================

/// World-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The same box moved by `delta`.
    pub fn translated(&self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Overlap test, inclusive on the boundary: boxes that merely touch
    /// count as intersecting (same convention as the separating-axis test
    /// rendering engines ship for Box3-style types).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

// ============================================================================
// COLLISION GATE
// ============================================================================

/// True if `current` translated by `displacement` overlaps any obstacle box.
///
/// Short-circuits on the first hit. An empty obstacle set never collides.
/// O(n) per query; callers invoke this at most once per frame, but nothing
/// here assumes the obstacle count stays small.
pub fn would_collide(current: &Aabb, displacement: Vec3, obstacles: &[Aabb]) -> bool {
    let candidate = current.translated(displacement);
    obstacles.iter().any(|o| candidate.intersects(o))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(1.0))
    }

    #[test]
    fn translated_moves_both_corners() {
        let b = unit_box_at(Vec3::ZERO).translated(Vec3::new(3.0, 0.0, -2.0));
        assert_eq!(b.min, Vec3::new(2.0, -1.0, -3.0));
        assert_eq!(b.max, Vec3::new(4.0, 1.0, -1.0));
    }

    #[test]
    fn disjoint_boxes_do_not_intersect() {
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(5.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn touching_boxes_intersect() {
        // Faces exactly coincide at x = 1.
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(2.0, 0.0, 0.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn gate_accepts_clear_move_and_rejects_blocked_move() {
        let character = unit_box_at(Vec3::ZERO);
        let obstacles = vec![unit_box_at(Vec3::new(10.0, 0.0, 0.0))];

        assert!(!would_collide(&character, Vec3::new(0.0, 0.0, -5.0), &obstacles));
        assert!(would_collide(&character, Vec3::new(9.0, 0.0, 0.0), &obstacles));
    }

    #[test]
    fn gate_with_no_obstacles_never_collides() {
        let character = unit_box_at(Vec3::ZERO);
        assert!(!would_collide(&character, Vec3::splat(100.0), &[]));
    }

    #[test]
    fn gate_tests_the_translated_extent_not_the_current_one() {
        // Obstacle sits exactly where the character would land.
        let character = unit_box_at(Vec3::ZERO);
        let obstacles = vec![unit_box_at(Vec3::new(0.0, 0.0, -4.0))];
        assert!(!would_collide(&character, Vec3::ZERO, &obstacles));
        assert!(would_collide(&character, Vec3::new(0.0, 0.0, -4.0), &obstacles));
    }
}
