//! Camera configuration

use serde::{Deserialize, Serialize};

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Orbit speed (degrees per pixel of pointer drag)
    pub drag_sensitivity: f32,
    /// Fraction of the current distance moved per scroll step
    pub zoom_sensitivity: f32,
    /// Closest the camera may get to its target
    pub min_distance: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Minimum elevation angle in degrees
    pub pitch_min: f32,
    /// Maximum elevation angle in degrees
    pub pitch_max: f32,
    /// Framing distance as a multiple of the model radius
    pub framing_scale: f32,
    /// Azimuth after a reset, in degrees
    pub default_azimuth: f32,
    /// Elevation after a reset, in degrees
    pub default_elevation: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.25,
            zoom_sensitivity: 0.1,
            min_distance: 0.1,
            fov: 45.0,
            near: 0.01,
            far: 1000.0,
            pitch_min: -89.0,
            pitch_max: 89.0,
            framing_scale: 2.5,
            default_azimuth: 45.0,
            default_elevation: 15.0,
        }
    }
}

impl CameraConfig {
    /// Replace values that would break the camera math with their defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        self.drag_sensitivity = positive(self.drag_sensitivity, defaults.drag_sensitivity);
        self.zoom_sensitivity = positive(self.zoom_sensitivity, defaults.zoom_sensitivity).min(0.9);
        self.min_distance = positive(self.min_distance, defaults.min_distance);
        self.fov = positive(self.fov, defaults.fov).min(170.0);
        self.near = positive(self.near, defaults.near);
        self.far = positive(self.far, defaults.far);
        if self.far <= self.near {
            self.near = defaults.near;
            self.far = defaults.far;
        }
        self.framing_scale = positive(self.framing_scale, defaults.framing_scale);
        self.pitch_min = self.pitch_min.clamp(-89.0, 0.0);
        self.pitch_max = self.pitch_max.clamp(0.0, 89.0);
        if !self.default_azimuth.is_finite() {
            self.default_azimuth = defaults.default_azimuth;
        }
        if !self.default_elevation.is_finite() {
            self.default_elevation = defaults.default_elevation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_valid_config() {
        let mut config = CameraConfig::default();
        config.sanitize();
        assert_eq!(config, CameraConfig::default());
    }

    #[test]
    fn test_sanitize_repairs_broken_values() {
        let mut config = CameraConfig {
            drag_sensitivity: -1.0,
            near: 10.0,
            far: 5.0,
            pitch_max: 120.0,
            fov: f32::NAN,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.drag_sensitivity, 0.25);
        assert_eq!(config.near, 0.01);
        assert_eq!(config.far, 1000.0);
        assert_eq!(config.pitch_max, 89.0);
        assert_eq!(config.fov, 45.0);
    }
}
