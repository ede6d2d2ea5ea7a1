use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// World-space vector. World units are level pixels with +y pointing up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn normalize_or_zero(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq <= f32::EPSILON {
            return Self::ZERO;
        }
        self * len_sq.sqrt().recip()
    }

    /// Unit vector for an angle measured counter-clockwise from +x.
    pub fn from_angle_radians(radians: f32) -> Self {
        Self {
            x: radians.cos(),
            y: radians.sin(),
        }
    }

    /// `atan2(y, x)` in degrees.
    pub fn angle_degrees(self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned box stored as center + half extents.
///
/// Overlap is strict: boxes that only share an edge do not overlap, so a body
/// resolved flush against a wall is not considered colliding with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: Vec2::new(size.x.abs() * 0.5, size.y.abs() * 0.5),
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    pub fn with_center(self, center: Vec2) -> Self {
        Self { center, ..self }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Self {
        let min = Vec2::new(self.min().x.min(other.min().x), self.min().y.min(other.min().y));
        let max = Vec2::new(self.max().x.max(other.max().x), self.max().y.max(other.max().y));
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let a_min = self.min();
        let a_max = self.max();
        let b_min = other.min();
        let b_max = other.max();
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    /// Slab test for the closed segment `from..=to`.
    pub fn intersects_segment(&self, from: Vec2, to: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        let delta = to - from;
        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;

        for (origin, dir, lo, hi) in [
            (from.x, delta.x, min.x, max.x),
            (from.y, delta.y, min.y, max.y),
        ] {
            if dir.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = dir.recip();
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb::from_center_size(Vec2::new(x, y), Vec2::new(2.0, 2.0))
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(2.0, 0.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&unit_box_at(1.5, 0.5)));
    }

    #[test]
    fn segment_through_box_intersects() {
        let wall = Aabb::from_center_size(Vec2::new(5.0, 0.0), Vec2::new(1.0, 10.0));
        assert!(wall.intersects_segment(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)));
        assert!(wall.intersects_segment(Vec2::new(10.0, 1.0), Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn segment_that_stops_short_or_passes_by_misses() {
        let wall = Aabb::from_center_size(Vec2::new(5.0, 0.0), Vec2::new(1.0, 10.0));
        assert!(!wall.intersects_segment(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0)));
        assert!(!wall.intersects_segment(Vec2::new(0.0, 6.0), Vec2::new(10.0, 6.0)));
    }

    #[test]
    fn axis_parallel_segment_outside_slab_misses() {
        let wall = unit_box_at(0.0, 0.0);
        assert!(!wall.intersects_segment(Vec2::new(3.0, -5.0), Vec2::new(3.0, 5.0)));
        assert!(wall.intersects_segment(Vec2::new(0.5, -5.0), Vec2::new(0.5, 5.0)));
    }

    #[test]
    fn angle_degrees_matches_atan2() {
        assert!((Vec2::new(0.0, 1.0).angle_degrees() - 90.0).abs() < 1e-4);
        assert!((Vec2::new(-1.0, 0.0).angle_degrees() - 180.0).abs() < 1e-4);
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
    }
}
