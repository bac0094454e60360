//! Vulkan-side storage for the resources the registry creates.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vrmview_assets::{TextureAsset, Vertex};
use vulkano::buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer};
use vulkano::command_buffer::allocator::StandardCommandBufferAllocator;
use vulkano::command_buffer::{
    AutoCommandBufferBuilder, CommandBufferUsage, CopyBufferToImageInfo, PrimaryCommandBufferAbstract,
};
use vulkano::descriptor_set::allocator::StandardDescriptorSetAllocator;
use vulkano::descriptor_set::layout::DescriptorSetLayout;
use vulkano::descriptor_set::{DescriptorSet, WriteDescriptorSet};
use vulkano::device::Queue;
use vulkano::format::Format;
use vulkano::image::sampler::{Sampler, SamplerCreateInfo};
use vulkano::image::view::ImageView;
use vulkano::image::{Image, ImageCreateInfo, ImageType, ImageUsage};
use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator};
use vulkano::sync::GpuFuture;

use crate::backend::{GpuBackend, GpuError};
use crate::handle::{BufferHandle, ResourceId, TextureHandle, ViewHandle};
use crate::vulkan::context::VulkanContext;

/// Buffers, images and sampled descriptor sets keyed by handle id.
///
/// Each texture view is stored as a ready-to-bind descriptor set for the mesh
/// pipeline's texture set.
pub struct VulkanResources {
    queue: Arc<Queue>,
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
    texture_layout: Arc<DescriptorSetLayout>,
    sampler: Arc<Sampler>,
    vertex_buffers: HashMap<ResourceId, Subbuffer<[u8]>>,
    index_buffers: HashMap<ResourceId, Subbuffer<[u32]>>,
    textures: HashMap<ResourceId, Arc<Image>>,
    views: HashMap<ResourceId, Arc<DescriptorSet>>,
}

impl VulkanResources {
    pub fn new(context: &VulkanContext, texture_layout: Arc<DescriptorSetLayout>) -> Result<Self, GpuError> {
        let sampler = Sampler::new(context.device.clone(), SamplerCreateInfo::simple_repeat_linear())
            .map_err(GpuError::backend)?;
        Ok(Self {
            queue: context.queue.clone(),
            memory_allocator: context.memory_allocator.clone(),
            command_buffer_allocator: context.command_buffer_allocator.clone(),
            descriptor_set_allocator: context.descriptor_set_allocator.clone(),
            texture_layout,
            sampler,
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            textures: HashMap::new(),
            views: HashMap::new(),
        })
    }

    pub fn vertex_buffer(&self, handle: BufferHandle) -> Option<&Subbuffer<[u8]>> {
        self.vertex_buffers.get(&handle.id())
    }

    pub fn index_buffer(&self, handle: BufferHandle) -> Option<&Subbuffer<[u32]>> {
        self.index_buffers.get(&handle.id())
    }

    pub fn texture_set(&self, view: ViewHandle) -> Option<&Arc<DescriptorSet>> {
        self.views.get(&view.id())
    }

    fn upload_allocation() -> AllocationCreateInfo {
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        }
    }
}

impl GpuBackend for VulkanResources {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferHandle, GpuError> {
        let buffer = Buffer::from_iter(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::VERTEX_BUFFER,
                ..Default::default()
            },
            Self::upload_allocation(),
            bytemuck::cast_slice::<Vertex, u8>(vertices).iter().copied(),
        )
        .map_err(GpuError::backend)?;
        let handle = BufferHandle::allocate();
        self.vertex_buffers.insert(handle.id(), buffer);
        Ok(handle)
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferHandle, GpuError> {
        let buffer = Buffer::from_iter(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::INDEX_BUFFER,
                ..Default::default()
            },
            Self::upload_allocation(),
            indices.iter().copied(),
        )
        .map_err(GpuError::backend)?;
        let handle = BufferHandle::allocate();
        self.index_buffers.insert(handle.id(), buffer);
        Ok(handle)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        let removed = self.vertex_buffers.remove(&buffer.id()).is_some()
            || self.index_buffers.remove(&buffer.id()).is_some();
        if !removed {
            warn!("Destroy of unknown buffer {}", buffer.id());
        }
    }

    fn create_texture(&mut self, texture: &TextureAsset, label: &str) -> Result<TextureHandle, GpuError> {
        let image = Image::new(
            self.memory_allocator.clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: Format::R8G8B8A8_SRGB,
                extent: [texture.width, texture.height, 1],
                usage: ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
                ..Default::default()
            },
            AllocationCreateInfo::default(),
        )
        .map_err(GpuError::backend)?;

        let staging = Buffer::from_iter(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            texture.data.iter().copied(),
        )
        .map_err(GpuError::backend)?;

        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(GpuError::backend)?;
        builder
            .copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(staging, image.clone()))
            .map_err(GpuError::backend)?;
        let command_buffer = builder.build().map_err(GpuError::backend)?;

        // Only called while loading; block until the copy has landed.
        command_buffer
            .execute(self.queue.clone())
            .map_err(GpuError::backend)?
            .then_signal_fence_and_flush()
            .map_err(GpuError::backend)?
            .wait(None)
            .map_err(GpuError::backend)?;

        let handle = TextureHandle::allocate();
        debug!("Uploaded texture '{}' ({}x{}) as {}", label, texture.width, texture.height, handle.id());
        self.textures.insert(handle.id(), image);
        Ok(handle)
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> Result<ViewHandle, GpuError> {
        let image = self
            .textures
            .get(&texture.id())
            .ok_or(GpuError::UnknownHandle(texture.id()))?;
        let view = ImageView::new_default(image.clone()).map_err(GpuError::backend)?;
        let set = DescriptorSet::new(
            self.descriptor_set_allocator.clone(),
            self.texture_layout.clone(),
            [WriteDescriptorSet::image_view_sampler(0, view, self.sampler.clone())],
            [],
        )
        .map_err(GpuError::backend)?;
        let handle = ViewHandle::allocate();
        self.views.insert(handle.id(), set);
        Ok(handle)
    }

    fn destroy_texture_view(&mut self, view: ViewHandle) {
        if self.views.remove(&view.id()).is_none() {
            warn!("Destroy of unknown texture view {}", view.id());
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture.id()).is_none() {
            warn!("Destroy of unknown texture {}", texture.id());
        }
    }
}
