use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a GPU resource.
pub type ResourceId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Marker for vertex and index buffers.
#[derive(Debug)]
pub enum GpuBuffer {}

/// Marker for 2D RGBA8 textures.
#[derive(Debug)]
pub enum GpuTexture {}

/// Marker for sampled views over a texture.
#[derive(Debug)]
pub enum GpuTextureView {}

pub type BufferHandle = Handle<GpuBuffer>;
pub type TextureHandle = Handle<GpuTexture>;
pub type ViewHandle = Handle<GpuTextureView>;

/// A typed handle referencing a resource owned by a [`GpuBackend`](crate::GpuBackend).
///
/// Handles are plain ids; the backend owns the actual resource and releases it
/// when the handle is passed back to one of its `destroy_*` methods.
#[derive(Debug)]
pub struct Handle<T> {
    id: ResourceId,
    _marker: PhantomData<T>,
}

impl<T> Handle<T> {
    /// Allocate a handle with a fresh process-wide id.
    pub fn allocate() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }

    /// The unique ID of this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocated_ids_are_unique() {
        let a = BufferHandle::allocate();
        let b = BufferHandle::allocate();
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_copies_compare_equal() {
        let texture = TextureHandle::allocate();
        let copy = texture;
        assert_eq!(texture, copy);
    }
}
