//! # Core Type Definitions
//!
//! The fundamental value types shared by the registries, the behavior tree
//! engine and the wire messages.
//!
//! - [`Point`] - planar `{x, z}` coordinate; the world is simulated in 2D
//! - [`PlayerId`] - monotonically increasing player sequence number
//! - [`MonsterId`] - monotonically increasing monster id, never reused

use serde::{Deserialize, Serialize};
use std::fmt;

/// Planar coordinate on the ground plane.
///
/// The vertical axis exists only for display and is carried separately
/// (see `Player::vertical_offset`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// East/west axis
    pub x: f32,
    /// North/south axis
    pub z: f32,
}

impl Point {
    /// Creates a point from its two planar components.
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Moves from `self` towards `target` by at most `step` distance units.
    ///
    /// Never overshoots: when `target` is closer than `step` the result is
    /// `target` itself.
    pub fn step_towards(&self, target: &Point, step: f32) -> Point {
        let dist = self.distance(target);
        if dist <= step || dist <= f32::EPSILON {
            return *target;
        }
        // unit direction first, then scale by step
        let (ux, uz) = ((target.x - self.x) / dist, (target.z - self.z) / dist);
        Point {
            x: self.x + ux * step,
            z: self.z + uz * step,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.z)
    }
}

/// Sequence number assigned to a player at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a live monster. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

impl fmt::Display for MonsterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_step_towards_moves_by_step() {
        let start = Point::new(0.0, 0.0);
        let next = start.step_towards(&Point::new(10.0, 0.0), 3.0);
        assert!((next.x - 3.0).abs() < 1e-6);
        assert_eq!(next.z, 0.0);
    }

    #[test]
    fn test_step_towards_never_overshoots() {
        let start = Point::new(0.0, 0.0);
        let target = Point::new(1.0, 1.0);
        assert_eq!(start.step_towards(&target, 5.0), target);
        assert_eq!(target.step_towards(&target, 5.0), target);
    }
}
