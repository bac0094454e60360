//! Per-frame draw planning.
//!
//! [`plan_frame`] turns the camera, the current model and the shading
//! parameters into a [`FramePlan`]: plain data with one [`DrawCall`] per mesh.
//! The vulkano backend executes the plan; nothing here touches the GPU.

use glam::{Mat4, Vec3};

use crate::handle::{BufferHandle, ViewHandle};
use crate::registry::Model;
use crate::scene::{SceneLighting, ShadingParams, SkyColors};
use crate::shader_interface::{DrawConstants, FrameUniforms, SkyConstants};

/// Camera matrices for one frame, already corrected for the target clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    /// Index count for indexed draws, vertex count otherwise.
    pub count: u32,
    pub texture_view: ViewHandle,
    pub constants: DrawConstants,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: [f32; 4],
    pub frame: FrameUniforms,
    pub sky: Option<SkyConstants>,
    pub draws: Vec<DrawCall>,
}

/// Build the draw plan for one frame. Meshes are drawn in model order.
pub fn plan_frame(
    model: Option<&Model>,
    camera: &CameraMatrices,
    lighting: &SceneLighting,
    sky: &SkyColors,
    shading: &ShadingParams,
) -> FramePlan {
    // Geometry is baked into world space.
    let model_matrix = Mat4::IDENTITY;
    let mvp = camera.projection * camera.view * model_matrix;

    let draws = model
        .map(|model| {
            model
                .meshes
                .iter()
                .map(|mesh| DrawCall {
                    vertex_buffer: mesh.vertex_buffer,
                    index_buffer: mesh.index_buffer,
                    count: mesh.draw_count(),
                    texture_view: mesh.texture_view,
                    constants: DrawConstants::new(mvp, lighting.light_direction, mesh.base_color),
                })
                .collect()
        })
        .unwrap_or_default();

    FramePlan {
        clear_color: lighting.clear_color,
        frame: FrameUniforms::new(model_matrix, camera.eye, lighting, shading),
        sky: shading
            .skybox_enabled
            .then(|| SkyConstants::new(camera.view, camera.projection, sky, shading)),
        draws,
    }
}
