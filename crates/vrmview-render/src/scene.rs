//! Scene-wide lighting and the user-tunable shading parameters.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fixed lighting for the viewer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLighting {
    /// Direction towards the light (normalized)
    pub light_direction: Vec3,
    /// Ambient term added to every lit surface
    pub ambient: Vec3,
    /// Color the frame is cleared to before anything is drawn
    pub clear_color: [f32; 4],
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            light_direction: Vec3::new(0.5, 1.0, 0.3).normalize(),
            ambient: Vec3::new(0.3, 0.3, 0.35),
            clear_color: [0.15, 0.15, 0.18, 1.0],
        }
    }
}

/// Sky colors for the procedural gradient skybox
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyColors {
    /// Color at the top of the sky
    pub zenith: Vec3,
    /// Color at the horizon
    pub horizon: Vec3,
}

impl Default for SkyColors {
    fn default() -> Self {
        Self {
            zenith: Vec3::new(0.1, 0.2, 0.5),
            horizon: Vec3::new(0.5, 0.6, 0.7),
        }
    }
}

pub const EXPOSURE_MIN: f32 = 0.1;
pub const EXPOSURE_MAX: f32 = 4.0;
pub const EXPOSURE_STEP: f32 = 0.1;
pub const LOD_MIN: f32 = 0.0;
pub const LOD_MAX: f32 = 8.0;
pub const LOD_STEP: f32 = 0.5;

/// Live shading parameters edited from the settings panel and the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    pub skybox_enabled: bool,
    /// Skybox brightness multiplier (0.1 - 4.0)
    pub exposure: f32,
    /// Skybox blur level; higher values soften the horizon (0.0 - 8.0)
    pub sky_lod: f32,
    /// Cel shading instead of the plain diffuse term
    pub toon_enabled: bool,
    pub toon_light_intensity: f32,
    pub shade_toony: f32,
    pub shade_strength: f32,
    pub rim_threshold: f32,
    pub rim_softness: f32,
    pub spec_intensity: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            skybox_enabled: true,
            exposure: 1.0,
            sky_lod: 0.0,
            toon_enabled: false,
            toon_light_intensity: 1.0,
            shade_toony: 0.9,
            shade_strength: 0.5,
            rim_threshold: 0.6,
            rim_softness: 0.1,
            spec_intensity: 0.2,
        }
    }
}

impl ShadingParams {
    pub fn step_exposure(&mut self, steps: f32) {
        self.exposure = (self.exposure + steps * EXPOSURE_STEP).clamp(EXPOSURE_MIN, EXPOSURE_MAX);
    }

    pub fn step_lod(&mut self, steps: f32) {
        self.sky_lod = (self.sky_lod + steps * LOD_STEP).clamp(LOD_MIN, LOD_MAX);
    }

    /// Pull every field back into its valid range, e.g. after loading from disk.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let fix = |value: f32, min: f32, max: f32, fallback: f32| {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                fallback
            }
        };
        self.exposure = fix(self.exposure, EXPOSURE_MIN, EXPOSURE_MAX, defaults.exposure);
        self.sky_lod = fix(self.sky_lod, LOD_MIN, LOD_MAX, defaults.sky_lod);
        self.toon_light_intensity = fix(self.toon_light_intensity, 0.0, 2.0, defaults.toon_light_intensity);
        self.shade_toony = fix(self.shade_toony, 0.0, 1.0, defaults.shade_toony);
        self.shade_strength = fix(self.shade_strength, 0.0, 1.0, defaults.shade_strength);
        self.rim_threshold = fix(self.rim_threshold, 0.0, 1.0, defaults.rim_threshold);
        self.rim_softness = fix(self.rim_softness, 0.0, 1.0, defaults.rim_softness);
        self.spec_intensity = fix(self.spec_intensity, 0.0, 1.0, defaults.spec_intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_direction_is_normalized() {
        let lighting = SceneLighting::default();
        assert!((lighting.light_direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_exposure_steps_clamp() {
        let mut params = ShadingParams::default();
        params.step_exposure(100.0);
        assert_eq!(params.exposure, EXPOSURE_MAX);
        params.step_exposure(-100.0);
        assert_eq!(params.exposure, EXPOSURE_MIN);
    }

    #[test]
    fn test_lod_steps() {
        let mut params = ShadingParams::default();
        params.step_lod(1.0);
        assert_eq!(params.sky_lod, LOD_STEP);
        params.step_lod(-4.0);
        assert_eq!(params.sky_lod, LOD_MIN);
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let mut params = ShadingParams {
            exposure: f32::NAN,
            rim_softness: 7.0,
            ..Default::default()
        };
        params.sanitize();
        assert_eq!(params.exposure, 1.0);
        assert_eq!(params.rim_softness, 1.0);
    }

    #[test]
    fn test_change_detection_by_equality() {
        let before = ShadingParams::default();
        let mut after = before;
        assert_eq!(before, after);
        after.shade_toony = 0.3;
        assert_ne!(before, after);
    }
}
