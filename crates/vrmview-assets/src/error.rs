use std::path::PathBuf;

/// Errors that can occur during asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse glTF file '{0}': {1}")]
    ParseFailed(PathBuf, #[source] gltf::Error),

    #[error("failed to load buffers for '{0}': {1}")]
    BufferLoadFailed(PathBuf, #[source] gltf::Error),

    #[error("failed to load image '{0}': {1}")]
    ImageLoadFailed(String, String),

    #[error("unsupported image source '{0}'")]
    UnsupportedImage(String),
}
