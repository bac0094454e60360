//! The seam between the registry and a concrete graphics API.

use vrmview_assets::{TextureAsset, Vertex};

use crate::handle::{BufferHandle, ResourceId, TextureHandle, ViewHandle};

/// Errors raised by a [`GpuBackend`].
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("GPU backend error: {0}")]
    Backend(String),
    #[error("Unknown GPU resource handle {0}")]
    UnknownHandle(ResourceId),
}

impl GpuError {
    /// Wrap any displayable backend error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Resource creation and destruction used by the scene registry.
///
/// Destroying a handle the backend does not know about is a no-op (logged by
/// the implementation); it never panics.
pub trait GpuBackend {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferHandle, GpuError>;

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferHandle, GpuError>;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Upload an RGBA8 image as a sampled 2D texture.
    fn create_texture(&mut self, texture: &TextureAsset, label: &str) -> Result<TextureHandle, GpuError>;

    fn create_texture_view(&mut self, texture: TextureHandle) -> Result<ViewHandle, GpuError>;

    fn destroy_texture_view(&mut self, view: ViewHandle);

    fn destroy_texture(&mut self, texture: TextureHandle);
}
