//! Data shared with the GLSL sources in `shaders/`.
//!
//! Layouts here must match the blocks declared in `mesh.vert`, `mesh.frag` and
//! `sky.frag` (std140 for the uniform block, std430-like packing for push
//! constants; every member is a vec4 or mat4 so the two agree).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use vulkano::buffer::BufferContents;

use crate::scene::{SceneLighting, ShadingParams, SkyColors};

pub const ATTRIBUTE_POSITION: u32 = 0;
pub const ATTRIBUTE_NORMAL: u32 = 1;
pub const ATTRIBUTE_UV: u32 = 2;

/// Descriptor set holding [`FrameUniforms`] at binding 0.
pub const FRAME_SET: u32 = 0;
/// Descriptor set holding the base-color combined image sampler at binding 0.
pub const TEXTURE_SET: u32 = 1;

/// Per-draw push constants
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, BufferContents, Pod, Zeroable)]
pub struct DrawConstants {
    pub mvp: [[f32; 4]; 4],
    pub light_dir: [f32; 4], // xyz = direction towards light
    pub base_color: [f32; 4],
}

impl DrawConstants {
    pub fn new(mvp: Mat4, light_direction: Vec3, base_color: [f32; 4]) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            light_dir: light_direction.extend(0.0).to_array(),
            base_color,
        }
    }
}

/// Frame-wide uniform block
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, BufferContents, Pod, Zeroable)]
pub struct FrameUniforms {
    pub model: [[f32; 4]; 4],
    pub ambient: [f32; 4],         // rgb = ambient color
    pub camera_position: [f32; 4], // xyz = eye, w = 1 when toon shading is on
    pub toon_shade: [f32; 4],      // x = light intensity, y = shade toony, z = shade strength
    pub toon_rim: [f32; 4],        // x = rim threshold, y = rim softness, z = spec intensity
}

impl FrameUniforms {
    pub fn new(model: Mat4, eye: Vec3, lighting: &SceneLighting, shading: &ShadingParams) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            ambient: lighting.ambient.extend(1.0).to_array(),
            camera_position: eye.extend(if shading.toon_enabled { 1.0 } else { 0.0 }).to_array(),
            toon_shade: [
                shading.toon_light_intensity,
                shading.shade_toony,
                shading.shade_strength,
                0.0,
            ],
            toon_rim: [
                shading.rim_threshold,
                shading.rim_softness,
                shading.spec_intensity,
                0.0,
            ],
        }
    }
}

/// Push constants for the fullscreen sky pass
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, BufferContents, Pod, Zeroable)]
pub struct SkyConstants {
    /// Inverse of projection × rotation-only view; maps clip space to view directions.
    pub inverse_view_projection: [[f32; 4]; 4],
    pub zenith: [f32; 4],
    pub horizon: [f32; 4],
    pub params: [f32; 4], // x = exposure, y = lod
}

impl SkyConstants {
    pub fn new(view: Mat4, projection: Mat4, colors: &SkyColors, shading: &ShadingParams) -> Self {
        let rotation_only = Mat4::from_mat3(glam::Mat3::from_mat4(view));
        Self {
            inverse_view_projection: (projection * rotation_only).inverse().to_cols_array_2d(),
            zenith: colors.zenith.extend(1.0).to_array(),
            horizon: colors.horizon.extend(1.0).to_array(),
            params: [shading.exposure, shading.sky_lod, 0.0, 0.0],
        }
    }
}
