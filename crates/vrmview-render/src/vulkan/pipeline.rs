//! Mesh and sky graphics pipelines.

use std::sync::Arc;

use vulkano::device::Device;
use vulkano::pipeline::graphics::color_blend::{ColorBlendAttachmentState, ColorBlendState};
use vulkano::pipeline::graphics::depth_stencil::{DepthState, DepthStencilState};
use vulkano::pipeline::graphics::input_assembly::InputAssemblyState;
use vulkano::pipeline::graphics::multisample::MultisampleState;
use vulkano::pipeline::graphics::rasterization::{CullMode, RasterizationState};
use vulkano::pipeline::graphics::vertex_input::{VertexDefinition, VertexInputState};
use vulkano::pipeline::graphics::viewport::ViewportState;
use vulkano::pipeline::graphics::GraphicsPipelineCreateInfo;
use vulkano::pipeline::layout::PipelineDescriptorSetLayoutCreateInfo;
use vulkano::pipeline::{DynamicState, GraphicsPipeline, PipelineLayout, PipelineShaderStageCreateInfo};
use vulkano::render_pass::{RenderPass, Subpass};
use vulkano::shader::{EntryPoint, ShaderModule};
use vulkano::Validated;
use vulkano::VulkanError;

use crate::backend::GpuError;
use crate::vertex::per_vertex;

mod mesh_vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "shaders/mesh.vert",
    }
}

mod mesh_fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "shaders/mesh.frag",
    }
}

mod sky_vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "shaders/sky.vert",
    }
}

mod sky_fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "shaders/sky.frag",
    }
}

pub struct Pipelines {
    pub mesh: Arc<GraphicsPipeline>,
    pub sky: Arc<GraphicsPipeline>,
}

impl Pipelines {
    pub fn new(device: Arc<Device>, render_pass: Arc<RenderPass>) -> Result<Self, GpuError> {
        let subpass = Subpass::from(render_pass, 0)
            .ok_or_else(|| GpuError::Backend("render pass has no subpass 0".into()))?;

        let mesh = {
            let vs = entry_point(mesh_vs::load(device.clone()), "mesh.vert")?;
            let fs = entry_point(mesh_fs::load(device.clone()), "mesh.frag")?;
            let vertex_input_state = per_vertex().definition(&vs).map_err(GpuError::backend)?;
            build(
                device.clone(),
                subpass.clone(),
                [vs, fs],
                vertex_input_state,
                RasterizationState {
                    cull_mode: CullMode::None,
                    ..Default::default()
                },
                DepthStencilState {
                    depth: Some(DepthState::simple()),
                    ..Default::default()
                },
            )?
        };

        // Fullscreen triangle behind everything; no depth test or write.
        let sky = {
            let vs = entry_point(sky_vs::load(device.clone()), "sky.vert")?;
            let fs = entry_point(sky_fs::load(device.clone()), "sky.frag")?;
            build(
                device,
                subpass,
                [vs, fs],
                VertexInputState::default(),
                RasterizationState::default(),
                DepthStencilState::default(),
            )?
        };

        Ok(Self { mesh, sky })
    }
}

fn entry_point(
    module: Result<Arc<ShaderModule>, Validated<VulkanError>>,
    name: &str,
) -> Result<EntryPoint, GpuError> {
    module
        .map_err(|e| GpuError::Backend(format!("{name}: {e}")))?
        .entry_point("main")
        .ok_or_else(|| GpuError::Backend(format!("{name}: no main entry point")))
}

fn build(
    device: Arc<Device>,
    subpass: Subpass,
    stages: [EntryPoint; 2],
    vertex_input_state: VertexInputState,
    rasterization_state: RasterizationState,
    depth_stencil_state: DepthStencilState,
) -> Result<Arc<GraphicsPipeline>, GpuError> {
    let stages = stages.map(PipelineShaderStageCreateInfo::new);
    let layout_info = PipelineDescriptorSetLayoutCreateInfo::from_stages(&stages)
        .into_pipeline_layout_create_info(device.clone())
        .map_err(|e| GpuError::Backend(format!("pipeline layout: {e:?}")))?;
    let layout = PipelineLayout::new(device.clone(), layout_info).map_err(GpuError::backend)?;

    GraphicsPipeline::new(
        device,
        None,
        GraphicsPipelineCreateInfo {
            stages: stages.into_iter().collect(),
            vertex_input_state: Some(vertex_input_state),
            input_assembly_state: Some(InputAssemblyState::default()),
            viewport_state: Some(ViewportState::default()),
            rasterization_state: Some(rasterization_state),
            multisample_state: Some(MultisampleState::default()),
            depth_stencil_state: Some(depth_stencil_state),
            color_blend_state: Some(ColorBlendState::with_attachment_states(
                subpass.num_color_attachments(),
                ColorBlendAttachmentState::default(),
            )),
            dynamic_state: [DynamicState::Viewport].into_iter().collect(),
            subpass: Some(subpass.into()),
            ..GraphicsPipelineCreateInfo::layout(layout)
        },
    )
    .map_err(GpuError::backend)
}
