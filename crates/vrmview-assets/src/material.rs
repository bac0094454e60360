//! Material and texture resolution
//!
//! Maps each primitive's material to a base color and a texture slot. Images
//! are decoded at most once per load, keyed by source image index, and any
//! decode failure degrades to the shared white fallback.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::asset::{SourceAsset, SourceImage};
use crate::error::AssetError;
use crate::texture::{self, TextureAsset};

/// Base color used when a primitive has no material.
pub const DEFAULT_BASE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Which texture a resolved material samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// The shared 2x2 white fallback.
    Default,
    /// Index into [`MaterialResolver::into_textures`].
    Loaded(usize),
}

/// A primitive's material reduced to what the fixed pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMaterial {
    pub base_color: [f32; 4],
    pub texture: TextureSlot,
}

impl Default for ResolvedMaterial {
    fn default() -> Self {
        Self {
            base_color: DEFAULT_BASE_COLOR,
            texture: TextureSlot::Default,
        }
    }
}

/// Per-load material resolver with an image-index keyed texture cache.
pub struct MaterialResolver<'a> {
    asset: &'a SourceAsset,
    cache: HashMap<usize, TextureSlot>,
    textures: Vec<TextureAsset>,
    failed: usize,
}

impl<'a> MaterialResolver<'a> {
    pub fn new(asset: &'a SourceAsset) -> Self {
        Self {
            asset,
            cache: HashMap::new(),
            textures: Vec::new(),
            failed: 0,
        }
    }

    /// Resolve a primitive's material index.
    pub fn resolve(&mut self, material: Option<usize>) -> ResolvedMaterial {
        let Some(material) = material.and_then(|index| self.asset.materials.get(index)) else {
            return ResolvedMaterial::default();
        };

        let texture = match material.base_color_image {
            Some(image) => self.resolve_image(image),
            None => TextureSlot::Default,
        };

        ResolvedMaterial {
            base_color: material.base_color_factor,
            texture,
        }
    }

    /// Decode `image` on first use; later calls return the cached slot.
    pub fn resolve_image(&mut self, image: usize) -> TextureSlot {
        if let Some(&slot) = self.cache.get(&image) {
            return slot;
        }

        let slot = match self.decode(image) {
            Ok(texture) => {
                self.textures.push(texture);
                TextureSlot::Loaded(self.textures.len() - 1)
            }
            Err(e) => {
                warn!("Using fallback texture for image {}: {}", image, e);
                self.failed += 1;
                TextureSlot::Default
            }
        };

        self.cache.insert(image, slot);
        slot
    }

    /// Number of images that fell back to the default texture.
    pub fn failed_count(&self) -> usize {
        self.failed
    }

    /// The decoded textures, indexed by [`TextureSlot::Loaded`].
    pub fn into_textures(self) -> Vec<TextureAsset> {
        self.textures
    }

    fn decode(&self, image: usize) -> Result<TextureAsset, AssetError> {
        let source = self
            .asset
            .images
            .get(image)
            .ok_or_else(|| AssetError::UnsupportedImage(format!("image #{image} does not exist")))?;

        match source {
            SourceImage::BufferView {
                buffer,
                offset,
                length,
            } => {
                let label = format!("image #{image} (embedded)");
                let bytes = self
                    .asset
                    .buffers
                    .get(*buffer)
                    .and_then(|data| data.get(*offset..offset.saturating_add(*length)))
                    .ok_or_else(|| {
                        AssetError::ImageLoadFailed(label.clone(), "buffer view out of range".into())
                    })?;
                texture::decode_texture(bytes, &label)
            }
            SourceImage::Uri(uri) if uri.starts_with("data:") => {
                Err(AssetError::UnsupportedImage(format!("image #{image} (data URI)")))
            }
            SourceImage::Uri(uri) => {
                let path = self.asset.base_dir.join(uri);
                let texture = texture::load_texture(&path)?;
                info!("Loaded texture: {}", path.display());
                Ok(texture)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SourceMaterial;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn asset_with_embedded_image() -> SourceAsset {
        let png = png_bytes([255, 0, 0, 255]);
        let mut buffer = vec![0u8; 8];
        let offset = buffer.len();
        buffer.extend_from_slice(&png);

        SourceAsset {
            base_dir: PathBuf::from("/nonexistent"),
            materials: vec![
                SourceMaterial {
                    base_color_factor: [0.5, 0.25, 1.0, 0.75],
                    base_color_image: Some(0),
                },
                SourceMaterial {
                    base_color_factor: [1.0, 1.0, 1.0, 1.0],
                    base_color_image: Some(0),
                },
                SourceMaterial {
                    base_color_factor: [0.1, 0.2, 0.3, 1.0],
                    base_color_image: None,
                },
                SourceMaterial {
                    base_color_factor: [1.0, 1.0, 1.0, 1.0],
                    base_color_image: Some(1),
                },
            ],
            images: vec![
                SourceImage::BufferView {
                    buffer: 0,
                    offset,
                    length: png.len(),
                },
                SourceImage::Uri("textures/missing.png".into()),
            ],
            buffers: vec![buffer],
            ..Default::default()
        }
    }

    #[test]
    fn no_material_is_opaque_white_with_default_texture() {
        let asset = SourceAsset::default();
        let mut resolver = MaterialResolver::new(&asset);
        assert_eq!(resolver.resolve(None), ResolvedMaterial::default());
        assert_eq!(resolver.resolve(Some(3)), ResolvedMaterial::default());
    }

    #[test]
    fn base_color_factor_is_used_verbatim() {
        let asset = asset_with_embedded_image();
        let mut resolver = MaterialResolver::new(&asset);
        let resolved = resolver.resolve(Some(2));
        assert_eq!(resolved.base_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(resolved.texture, TextureSlot::Default);
    }

    #[test]
    fn embedded_image_is_decoded_once_and_shared() {
        let asset = asset_with_embedded_image();
        let mut resolver = MaterialResolver::new(&asset);

        let first = resolver.resolve(Some(0));
        let second = resolver.resolve(Some(1));
        assert_eq!(first.base_color, [0.5, 0.25, 1.0, 0.75]);
        assert_eq!(first.texture, TextureSlot::Loaded(0));
        assert_eq!(second.texture, TextureSlot::Loaded(0));

        let textures = resolver.into_textures();
        assert_eq!(textures.len(), 1);
        assert_eq!(&textures[0].data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_external_image_falls_back() {
        let asset = asset_with_embedded_image();
        let mut resolver = MaterialResolver::new(&asset);

        let resolved = resolver.resolve(Some(3));
        assert_eq!(resolved.texture, TextureSlot::Default);
        assert_eq!(resolver.failed_count(), 1);

        // Cached: a second lookup does not retry the file.
        resolver.resolve(Some(3));
        assert_eq!(resolver.failed_count(), 1);
    }

    #[test]
    fn out_of_range_view_and_data_uri_fall_back() {
        let mut asset = asset_with_embedded_image();
        asset.images[0] = SourceImage::BufferView {
            buffer: 0,
            offset: 4,
            length: 10_000,
        };
        asset.images[1] = SourceImage::Uri("data:image/png;base64,AAAA".into());

        let mut resolver = MaterialResolver::new(&asset);
        assert_eq!(resolver.resolve_image(0), TextureSlot::Default);
        assert_eq!(resolver.resolve_image(1), TextureSlot::Default);
        assert_eq!(resolver.resolve_image(9), TextureSlot::Default);
        assert_eq!(resolver.failed_count(), 3);
        assert!(resolver.into_textures().is_empty());
    }
}
