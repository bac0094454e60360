//! Axis-aligned bounding volume accumulated while baking geometry

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Radius substituted when a model is degenerate (a point or empty).
pub const MIN_RADIUS: f32 = 1.0;

/// Radii below this are considered degenerate.
pub const RADIUS_EPSILON: f32 = 0.001;

/// Running min/max box over world-space positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// An inverted box that any included point will replace.
    pub const fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// True until at least one point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `point`.
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Midpoint of the box, or the origin when nothing was included.
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    /// Half the diagonal length, floored to [`MIN_RADIUS`] for degenerate boxes.
    pub fn radius(&self) -> f32 {
        if self.is_empty() {
            return MIN_RADIUS;
        }
        let radius = (self.max - self.min).length() * 0.5;
        if radius < RADIUS_EPSILON || !radius.is_finite() {
            MIN_RADIUS
        } else {
            radius
        }
    }
}
