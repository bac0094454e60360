use tracing::debug;
use vrmview_assets::TextureAsset;

use crate::backend::{GpuBackend, GpuError};
use crate::handle::{TextureHandle, ViewHandle};

/// The shared 2×2 opaque white texture bound for untextured materials and
/// failed decodes. Created once when the renderer starts and released only by
/// [`DefaultTexture::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultTexture {
    pub texture: TextureHandle,
    pub view: ViewHandle,
}

impl DefaultTexture {
    pub fn create(backend: &mut impl GpuBackend) -> Result<Self, GpuError> {
        let texture = backend.create_texture(&TextureAsset::white(), "default white")?;
        let view = match backend.create_texture_view(texture) {
            Ok(view) => view,
            Err(err) => {
                backend.destroy_texture(texture);
                return Err(err);
            }
        };
        debug!("Created default texture {}", texture.id());
        Ok(Self { texture, view })
    }

    pub fn destroy(self, backend: &mut impl GpuBackend) {
        backend.destroy_texture_view(self.view);
        backend.destroy_texture(self.texture);
    }
}
