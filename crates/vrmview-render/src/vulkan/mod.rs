//! Vulkan backend: swapchain, render pass and frame submission.

mod context;
mod pipeline;
mod resources;

use std::sync::Arc;

use glam::Mat4;
use tracing::{error, info, warn};
use vulkano::command_buffer::{
    AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer, RenderPassBeginInfo,
    SubpassBeginInfo, SubpassContents, SubpassEndInfo,
};
use vulkano::buffer::allocator::{SubbufferAllocator, SubbufferAllocatorCreateInfo};
use vulkano::buffer::BufferUsage;
use vulkano::descriptor_set::{DescriptorSet, WriteDescriptorSet};
use vulkano::device::{Device, Queue};
use vulkano::format::Format;
use vulkano::image::view::ImageView;
use vulkano::image::{Image, ImageCreateInfo, ImageType, ImageUsage};
use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator};
use vulkano::pipeline::graphics::viewport::Viewport;
use vulkano::pipeline::{Pipeline, PipelineBindPoint};
use vulkano::render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass};
use vulkano::swapchain::{self, Surface, Swapchain, SwapchainCreateInfo, SwapchainPresentInfo};
use vulkano::sync::{self, GpuFuture};
use vulkano::{Validated, VulkanError};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::backend::GpuError;
use crate::frame::FramePlan;
use crate::shader_interface::{FrameUniforms, FRAME_SET, TEXTURE_SET};

pub use context::VulkanContext;
pub use pipeline::Pipelines;
pub use resources::VulkanResources;

/// Flips clip-space Y so right-handed, Y-up projections land upright in
/// Vulkan's Y-down clip space. Apply to the projection before planning a frame.
pub const CLIP_CORRECTION: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

const DEPTH_FORMAT: Format = Format::D16_UNORM;

pub struct VulkanRenderer {
    window: Arc<Window>,
    context: VulkanContext,
    uniform_allocator: SubbufferAllocator,
    swapchain: Arc<Swapchain>,
    render_pass: Arc<RenderPass>,
    framebuffers: Vec<Arc<Framebuffer>>,
    image_views: Vec<Arc<ImageView>>,
    pipelines: Pipelines,
    resources: VulkanResources,
    recreate_swapchain: bool,
    previous_frame_end: Option<Box<dyn GpuFuture>>,
}

impl VulkanRenderer {
    pub fn new(event_loop: &ActiveEventLoop, window: Arc<Window>) -> Result<Self, GpuError> {
        let context = VulkanContext::new(event_loop, window.clone())?;
        let device = context.device.clone();

        let (swapchain, images) = create_swapchain(&device, &context.surface, &window)?;
        info!(
            "Swapchain: {:?}, {} images, {:?}",
            swapchain.image_format(),
            images.len(),
            swapchain.image_extent()
        );

        let render_pass = vulkano::single_pass_renderpass!(
            device.clone(),
            attachments: {
                color: {
                    format: swapchain.image_format(),
                    samples: 1,
                    load_op: Clear,
                    store_op: Store,
                },
                depth_stencil: {
                    format: DEPTH_FORMAT,
                    samples: 1,
                    load_op: Clear,
                    store_op: DontCare,
                },
            },
            pass: {
                color: [color],
                depth_stencil: {depth_stencil},
            },
        )
        .map_err(GpuError::backend)?;

        let (framebuffers, image_views) =
            window_size_dependent_setup(&context.memory_allocator, &images, &render_pass)?;
        let pipelines = Pipelines::new(device.clone(), render_pass.clone())?;

        let texture_layout = pipelines
            .mesh
            .layout()
            .set_layouts()
            .get(TEXTURE_SET as usize)
            .cloned()
            .ok_or_else(|| GpuError::Backend("mesh pipeline has no texture set".into()))?;
        let resources = VulkanResources::new(&context, texture_layout)?;

        let uniform_allocator = SubbufferAllocator::new(
            context.memory_allocator.clone(),
            SubbufferAllocatorCreateInfo {
                buffer_usage: BufferUsage::UNIFORM_BUFFER,
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
        );

        let previous_frame_end = Some(sync::now(device).boxed());

        Ok(Self {
            window,
            context,
            uniform_allocator,
            swapchain,
            render_pass,
            framebuffers,
            image_views,
            pipelines,
            resources,
            recreate_swapchain: false,
            previous_frame_end,
        })
    }

    /// The resource store, for the scene registry.
    pub fn resources_mut(&mut self) -> &mut VulkanResources {
        &mut self.resources
    }

    pub fn surface(&self) -> Arc<Surface> {
        self.context.surface.clone()
    }

    pub fn queue(&self) -> Arc<Queue> {
        self.context.queue.clone()
    }

    pub fn output_format(&self) -> Format {
        self.swapchain.image_format()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn aspect_ratio(&self) -> f32 {
        let size = self.window.inner_size();
        if size.height == 0 {
            1.0
        } else {
            size.width as f32 / size.height as f32
        }
    }

    pub fn request_resize(&mut self) {
        self.recreate_swapchain = true;
    }

    /// Block until the last submitted frame has finished on the GPU.
    pub fn finish_frames(&mut self) {
        // Dropping a fence-signal future waits on its fence.
        self.previous_frame_end = Some(sync::now(self.context.device.clone()).boxed());
    }

    /// Execute a frame plan, then hand the swapchain image to `overlay` (the
    /// GUI) before presenting.
    pub fn render<F>(&mut self, plan: &FramePlan, overlay: F) -> Result<(), GpuError>
    where
        F: FnOnce(Box<dyn GpuFuture>, Arc<ImageView>) -> Box<dyn GpuFuture>,
    {
        let extent: [u32; 2] = self.window.inner_size().into();
        if extent.contains(&0) {
            return Ok(());
        }

        if let Some(previous) = self.previous_frame_end.as_mut() {
            previous.cleanup_finished();
        }

        if self.recreate_swapchain {
            self.rebuild_swapchain(extent)?;
            self.recreate_swapchain = false;
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None).map_err(Validated::unwrap) {
                Ok(acquired) => acquired,
                Err(VulkanError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    return Ok(());
                }
                Err(e) => return Err(GpuError::backend(e)),
            };
        if suboptimal {
            self.recreate_swapchain = true;
        }

        let command_buffer = self.record(plan, image_index as usize, extent)?;

        let previous = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(self.context.device.clone()).boxed());
        let scene_future = previous
            .join(acquire_future)
            .then_execute(self.context.queue.clone(), command_buffer)
            .map_err(GpuError::backend)?;

        let target = self.image_views[image_index as usize].clone();
        let after_overlay = overlay(scene_future.boxed(), target);

        let presented = after_overlay
            .then_swapchain_present(
                self.context.queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), image_index),
            )
            .then_signal_fence_and_flush();

        match presented.map_err(Validated::unwrap) {
            Ok(future) => self.previous_frame_end = Some(future.boxed()),
            Err(VulkanError::OutOfDate) => {
                self.recreate_swapchain = true;
                self.previous_frame_end = Some(sync::now(self.context.device.clone()).boxed());
            }
            Err(e) => {
                error!("Failed to flush frame: {}", e);
                self.previous_frame_end = Some(sync::now(self.context.device.clone()).boxed());
            }
        }
        Ok(())
    }

    fn record(
        &mut self,
        plan: &FramePlan,
        image_index: usize,
        extent: [u32; 2],
    ) -> Result<Arc<PrimaryAutoCommandBuffer>, GpuError> {
        let mut builder = AutoCommandBufferBuilder::primary(
            self.context.command_buffer_allocator.clone(),
            self.context.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(GpuError::backend)?;

        let framebuffer = self
            .framebuffers
            .get(image_index)
            .cloned()
            .ok_or_else(|| GpuError::Backend(format!("no framebuffer for image {image_index}")))?;

        builder
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: vec![Some(plan.clear_color.into()), Some(1f32.into())],
                    ..RenderPassBeginInfo::framebuffer(framebuffer)
                },
                SubpassBeginInfo {
                    contents: SubpassContents::Inline,
                    ..Default::default()
                },
            )
            .map_err(GpuError::backend)?
            .set_viewport(
                0,
                [Viewport {
                    offset: [0.0, 0.0],
                    extent: [extent[0] as f32, extent[1] as f32],
                    depth_range: 0.0..=1.0,
                }]
                .into_iter()
                .collect(),
            )
            .map_err(GpuError::backend)?;

        if let Some(sky) = plan.sky {
            let sky_pipeline = self.pipelines.sky.clone();
            builder
                .bind_pipeline_graphics(sky_pipeline.clone())
                .map_err(GpuError::backend)?
                .push_constants(sky_pipeline.layout().clone(), 0, sky)
                .map_err(GpuError::backend)?;
            unsafe { builder.draw(3, 1, 0, 0) }.map_err(GpuError::backend)?;
        }

        if !plan.draws.is_empty() {
            let mesh_pipeline = self.pipelines.mesh.clone();
            let layout = mesh_pipeline.layout().clone();

            let uniforms = self
                .uniform_allocator
                .allocate_sized::<FrameUniforms>()
                .map_err(GpuError::backend)?;
            *uniforms.write().map_err(GpuError::backend)? = plan.frame;

            let frame_layout = layout
                .set_layouts()
                .get(FRAME_SET as usize)
                .cloned()
                .ok_or_else(|| GpuError::Backend("mesh pipeline has no frame set".into()))?;
            let frame_set = DescriptorSet::new(
                self.context.descriptor_set_allocator.clone(),
                frame_layout,
                [WriteDescriptorSet::buffer(0, uniforms)],
                [],
            )
            .map_err(GpuError::backend)?;

            builder
                .bind_pipeline_graphics(mesh_pipeline)
                .map_err(GpuError::backend)?
                .bind_descriptor_sets(PipelineBindPoint::Graphics, layout.clone(), FRAME_SET, frame_set)
                .map_err(GpuError::backend)?;

            for draw in &plan.draws {
                let (Some(vertex_buffer), Some(texture_set)) = (
                    self.resources.vertex_buffer(draw.vertex_buffer),
                    self.resources.texture_set(draw.texture_view),
                ) else {
                    warn!("Skipping draw with released resources");
                    continue;
                };

                builder
                    .bind_descriptor_sets(
                        PipelineBindPoint::Graphics,
                        layout.clone(),
                        TEXTURE_SET,
                        texture_set.clone(),
                    )
                    .map_err(GpuError::backend)?
                    .bind_vertex_buffers(0, vertex_buffer.clone())
                    .map_err(GpuError::backend)?
                    .push_constants(layout.clone(), 0, draw.constants)
                    .map_err(GpuError::backend)?;

                match draw.index_buffer.and_then(|handle| self.resources.index_buffer(handle)) {
                    Some(index_buffer) => {
                        builder
                            .bind_index_buffer(index_buffer.clone())
                            .map_err(GpuError::backend)?;
                        unsafe { builder.draw_indexed(draw.count, 1, 0, 0, 0) }.map_err(GpuError::backend)?;
                    }
                    None => {
                        unsafe { builder.draw(draw.count, 1, 0, 0) }.map_err(GpuError::backend)?;
                    }
                }
            }
        }

        builder
            .end_render_pass(SubpassEndInfo::default())
            .map_err(GpuError::backend)?;
        builder.build().map_err(GpuError::backend)
    }

    fn rebuild_swapchain(&mut self, extent: [u32; 2]) -> Result<(), GpuError> {
        let (swapchain, images) = self
            .swapchain
            .recreate(SwapchainCreateInfo {
                image_extent: extent,
                ..self.swapchain.create_info()
            })
            .map_err(GpuError::backend)?;
        self.swapchain = swapchain;
        let (framebuffers, image_views) =
            window_size_dependent_setup(&self.context.memory_allocator, &images, &self.render_pass)?;
        self.framebuffers = framebuffers;
        self.image_views = image_views;
        info!("Swapchain recreated at {}x{}", extent[0], extent[1]);
        Ok(())
    }
}

fn create_swapchain(
    device: &Arc<Device>,
    surface: &Arc<Surface>,
    window: &Window,
) -> Result<(Arc<Swapchain>, Vec<Arc<Image>>), GpuError> {
    let physical = device.physical_device();
    let capabilities = physical
        .surface_capabilities(surface, Default::default())
        .map_err(GpuError::backend)?;
    let formats = physical
        .surface_formats(surface, Default::default())
        .map_err(GpuError::backend)?;

    let image_format = formats
        .iter()
        .map(|(format, _)| *format)
        .find(|format| matches!(format, Format::B8G8R8A8_SRGB | Format::R8G8B8A8_SRGB))
        .or_else(|| formats.first().map(|(format, _)| *format))
        .ok_or_else(|| GpuError::Backend("surface reports no formats".into()))?;
    let composite_alpha = capabilities
        .supported_composite_alpha
        .into_iter()
        .next()
        .ok_or_else(|| GpuError::Backend("surface reports no composite alpha mode".into()))?;

    Swapchain::new(
        device.clone(),
        surface.clone(),
        SwapchainCreateInfo {
            min_image_count: capabilities.min_image_count.max(2),
            image_format,
            image_extent: window.inner_size().into(),
            image_usage: ImageUsage::COLOR_ATTACHMENT,
            composite_alpha,
            ..Default::default()
        },
    )
    .map_err(GpuError::backend)
}

fn window_size_dependent_setup(
    memory_allocator: &Arc<StandardMemoryAllocator>,
    images: &[Arc<Image>],
    render_pass: &Arc<RenderPass>,
) -> Result<(Vec<Arc<Framebuffer>>, Vec<Arc<ImageView>>), GpuError> {
    let extent = images
        .first()
        .map(|image| image.extent())
        .ok_or_else(|| GpuError::Backend("swapchain has no images".into()))?;

    let depth = Image::new(
        memory_allocator.clone(),
        ImageCreateInfo {
            image_type: ImageType::Dim2d,
            format: DEPTH_FORMAT,
            extent,
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::TRANSIENT_ATTACHMENT,
            ..Default::default()
        },
        AllocationCreateInfo::default(),
    )
    .map_err(GpuError::backend)?;
    let depth_view = ImageView::new_default(depth).map_err(GpuError::backend)?;

    let mut framebuffers = Vec::with_capacity(images.len());
    let mut views = Vec::with_capacity(images.len());
    for image in images {
        let view = ImageView::new_default(image.clone()).map_err(GpuError::backend)?;
        let framebuffer = Framebuffer::new(
            render_pass.clone(),
            FramebufferCreateInfo {
                attachments: vec![view.clone(), depth_view.clone()],
                ..Default::default()
            },
        )
        .map_err(GpuError::backend)?;
        framebuffers.push(framebuffer);
        views.push(view);
    }
    Ok((framebuffers, views))
}
