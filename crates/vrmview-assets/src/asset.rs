//! The transient asset graph produced by the loader and consumed by the baker

use std::path::PathBuf;

use glam::Mat4;

use crate::mesh::SourceMesh;

/// Parsed node/mesh/material/image graph with buffer bytes loaded.
///
/// Lives only for the duration of one load; everything the renderer needs is
/// copied out by the baker and the material resolver.
#[derive(Debug, Clone, Default)]
pub struct SourceAsset {
    /// The file this asset was loaded from.
    pub path: PathBuf,
    /// Directory external image URIs are resolved against.
    pub base_dir: PathBuf,
    /// Nodes in document order, each with its composed world matrix.
    pub nodes: Vec<SourceNode>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    pub images: Vec<SourceImage>,
    pub buffers: Vec<Vec<u8>>,
    /// The file declares the VRM extension.
    pub is_vrm: bool,
}

/// A scene node reduced to what baking needs.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: Option<String>,
    /// Local TRS composed along the ancestor chain.
    pub world: Mat4,
    pub mesh: Option<usize>,
}

/// Metallic-roughness base color data of a material.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMaterial {
    pub base_color_factor: [f32; 4],
    pub base_color_image: Option<usize>,
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_image: None,
        }
    }
}

/// Where an image's encoded bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceImage {
    /// Byte range inside one of the asset's buffers.
    BufferView {
        buffer: usize,
        offset: usize,
        length: usize,
    },
    /// URI relative to the directory of the loading file.
    Uri(String),
}
