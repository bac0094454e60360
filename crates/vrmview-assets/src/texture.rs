//! RGBA8 texture decoding

use std::path::Path;

use crate::error::AssetError;

/// A decoded texture with tightly packed RGBA8 pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureAsset {
    /// A texture filled with a single color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// The 2x2 opaque white fallback used for missing or broken textures.
    pub fn white() -> Self {
        Self::solid(2, 2, [0xFF; 4])
    }
}

/// Load an image file and return it as an RGBA8 TextureAsset.
pub fn load_texture(path: &Path) -> Result<TextureAsset, AssetError> {
    let img = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.display().to_string(), e.to_string()))?;
    into_texture(img, &path.display().to_string())
}

/// Decode an in-memory encoded image (PNG, JPEG, ...) into an RGBA8 TextureAsset.
pub fn decode_texture(bytes: &[u8], label: &str) -> Result<TextureAsset, AssetError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AssetError::ImageLoadFailed(label.to_string(), e.to_string()))?;
    into_texture(img, label)
}

fn into_texture(img: image::DynamicImage, label: &str) -> Result<TextureAsset, AssetError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::ImageLoadFailed(
            label.to_string(),
            "image has no pixels".into(),
        ));
    }

    Ok(TextureAsset {
        width,
        height,
        data: rgba.into_raw(),
    })
}
