//! A [`GpuBackend`] with no device behind it.
//!
//! Hands out handles, tracks which resources are alive and how many bytes they
//! would occupy, and keeps an ordered event log. `vrmview --inspect` runs a load
//! through it, and the tests use it to check resource lifetimes.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use vrmview_assets::{TextureAsset, Vertex};

use crate::backend::{GpuBackend, GpuError};
use crate::handle::{BufferHandle, ResourceId, TextureHandle, ViewHandle};

/// Which kind of buffer a handle was created as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// One backend call, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    CreateBuffer(BufferHandle, BufferUsage),
    DestroyBuffer(BufferHandle),
    CreateTexture(TextureHandle),
    CreateView(ViewHandle),
    DestroyView(ViewHandle),
    DestroyTexture(TextureHandle),
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    buffers: HashMap<ResourceId, (BufferUsage, usize)>,
    textures: HashMap<ResourceId, usize>,
    views: HashSet<ResourceId>,
    events: Vec<BackendEvent>,
    creations: usize,
    fail_after: Option<usize>,
    unknown_destroys: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every creation after the first `count` successful ones.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_views(&self) -> usize {
        self.views.len()
    }

    /// Total bytes held by live buffers and textures.
    pub fn live_bytes(&self) -> usize {
        self.buffers.values().map(|(_, bytes)| bytes).sum::<usize>()
            + self.textures.values().sum::<usize>()
    }

    /// Number of destroy calls that named a resource that was not alive.
    pub fn unknown_destroys(&self) -> usize {
        self.unknown_destroys
    }

    pub fn is_buffer_alive(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer.id())
    }

    pub fn is_texture_alive(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture.id())
    }

    pub fn is_view_alive(&self, view: ViewHandle) -> bool {
        self.views.contains(&view.id())
    }

    fn admit(&mut self) -> Result<(), GpuError> {
        if let Some(limit) = self.fail_after {
            if self.creations >= limit {
                return Err(GpuError::Backend(format!(
                    "headless allocation limit of {limit} reached"
                )));
            }
        }
        self.creations += 1;
        Ok(())
    }

    fn create_buffer(&mut self, usage: BufferUsage, bytes: usize) -> Result<BufferHandle, GpuError> {
        if bytes == 0 {
            return Err(GpuError::Backend("zero-sized buffer".into()));
        }
        self.admit()?;
        let handle = BufferHandle::allocate();
        self.buffers.insert(handle.id(), (usage, bytes));
        self.events.push(BackendEvent::CreateBuffer(handle, usage));
        Ok(handle)
    }

    fn note_unknown(&mut self, kind: &str, id: ResourceId) {
        warn!("Destroy of unknown {} {}", kind, id);
        self.unknown_destroys += 1;
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferHandle, GpuError> {
        self.create_buffer(BufferUsage::Vertex, std::mem::size_of_val(vertices))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferHandle, GpuError> {
        self.create_buffer(BufferUsage::Index, std::mem::size_of_val(indices))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.id()).is_some() {
            self.events.push(BackendEvent::DestroyBuffer(buffer));
        } else {
            self.note_unknown("buffer", buffer.id());
        }
    }

    fn create_texture(&mut self, texture: &TextureAsset, _label: &str) -> Result<TextureHandle, GpuError> {
        let expected = texture.width as usize * texture.height as usize * 4;
        if texture.width == 0 || texture.height == 0 || texture.data.len() != expected {
            return Err(GpuError::Backend(format!(
                "texture data is {} bytes, expected {} for {}x{}",
                texture.data.len(),
                expected,
                texture.width,
                texture.height
            )));
        }
        self.admit()?;
        let handle = TextureHandle::allocate();
        self.textures.insert(handle.id(), expected);
        self.events.push(BackendEvent::CreateTexture(handle));
        Ok(handle)
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> Result<ViewHandle, GpuError> {
        if !self.textures.contains_key(&texture.id()) {
            return Err(GpuError::UnknownHandle(texture.id()));
        }
        self.admit()?;
        let handle = ViewHandle::allocate();
        self.views.insert(handle.id());
        self.events.push(BackendEvent::CreateView(handle));
        Ok(handle)
    }

    fn destroy_texture_view(&mut self, view: ViewHandle) {
        if self.views.remove(&view.id()) {
            self.events.push(BackendEvent::DestroyView(view));
        } else {
            self.note_unknown("texture view", view.id());
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture.id()).is_some() {
            self.events.push(BackendEvent::DestroyTexture(texture));
        } else {
            self.note_unknown("texture", texture.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vertex> {
        vec![Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3]
    }

    #[test]
    fn test_tracks_live_resources() {
        let mut backend = HeadlessBackend::new();
        let vb = backend.create_vertex_buffer(&triangle()).unwrap();
        let ib = backend.create_index_buffer(&[0, 1, 2]).unwrap();
        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(backend.live_bytes(), 3 * 32 + 3 * 4);

        backend.destroy_buffer(vb);
        backend.destroy_buffer(ib);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_bytes(), 0);
        assert_eq!(backend.unknown_destroys(), 0);
    }

    #[test]
    fn test_double_destroy_is_counted_not_fatal() {
        let mut backend = HeadlessBackend::new();
        let texture = backend.create_texture(&TextureAsset::white(), "white").unwrap();
        backend.destroy_texture(texture);
        backend.destroy_texture(texture);
        assert_eq!(backend.unknown_destroys(), 1);
    }

    #[test]
    fn test_fail_after_limit() {
        let mut backend = HeadlessBackend::new().fail_after(1);
        assert!(backend.create_index_buffer(&[0, 1, 2]).is_ok());
        assert!(backend.create_index_buffer(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_rejects_malformed_texture() {
        let mut backend = HeadlessBackend::new();
        let bad = TextureAsset {
            width: 4,
            height: 4,
            data: vec![0; 3],
        };
        assert!(backend.create_texture(&bad, "bad").is_err());
        assert_eq!(backend.live_textures(), 0);
    }
}
