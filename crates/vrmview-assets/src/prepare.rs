//! CPU-side model preparation: parse, bake and resolve before any GPU work

use std::path::{Path, PathBuf};

use tracing::info;
use vrmview_core::Bounds;

use crate::asset::SourceAsset;
use crate::bake;
use crate::error::AssetError;
use crate::gltf_loader;
use crate::material::{MaterialResolver, TextureSlot};
use crate::mesh::Vertex;
use crate::texture::TextureAsset;

/// One drawable primitive, baked and with its material resolved.
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
    pub base_color: [f32; 4],
    pub texture: TextureSlot,
}

/// Everything needed to create GPU resources for a model, with no GPU work done.
#[derive(Debug, Clone)]
pub struct PreparedModel {
    pub source: PathBuf,
    pub meshes: Vec<PreparedMesh>,
    /// Unique decoded textures, indexed by [`TextureSlot::Loaded`].
    pub textures: Vec<TextureAsset>,
    pub bounds: Bounds,
    pub is_vrm: bool,
    pub skipped_primitives: usize,
    pub failed_textures: usize,
}

/// Parse, bake and resolve a model file on the CPU.
///
/// The parsed asset is dropped before this returns.
pub fn prepare_model(path: &Path) -> Result<PreparedModel, AssetError> {
    let asset = gltf_loader::load_asset(path)?;
    Ok(prepare_asset(asset))
}

/// Bake and resolve an already parsed asset, consuming it.
pub fn prepare_asset(asset: SourceAsset) -> PreparedModel {
    let baked = bake::bake_asset(&asset);
    let mut resolver = MaterialResolver::new(&asset);

    let meshes: Vec<PreparedMesh> = baked
        .primitives
        .into_iter()
        .map(|primitive| {
            let material = resolver.resolve(primitive.material);
            PreparedMesh {
                vertices: primitive.vertices,
                indices: primitive.indices,
                base_color: material.base_color,
                texture: material.texture,
            }
        })
        .collect();

    let failed_textures = resolver.failed_count();
    let textures = resolver.into_textures();

    info!(
        "Prepared '{}': {} meshes, {} textures ({} fell back), {} primitives skipped",
        asset.path.display(),
        meshes.len(),
        textures.len(),
        failed_textures,
        baked.skipped
    );

    PreparedModel {
        source: asset.path,
        meshes,
        textures,
        bounds: baked.bounds,
        is_vrm: asset.is_vrm,
        skipped_primitives: baked.skipped,
        failed_textures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{SourceMaterial, SourceNode};
    use crate::mesh::{SourceMesh, SourcePrimitive};
    use glam::Mat4;

    #[test]
    fn prepares_meshes_in_node_order_with_materials() {
        let mut textured = SourcePrimitive::triangles(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        textured.material = Some(0);
        let plain = SourcePrimitive::triangles(vec![[0.0; 3], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);

        let asset = SourceAsset {
            path: PathBuf::from("model.gltf"),
            nodes: vec![SourceNode {
                name: None,
                world: Mat4::IDENTITY,
                mesh: Some(0),
            }],
            meshes: vec![SourceMesh {
                name: "body".into(),
                primitives: vec![textured, plain],
            }],
            materials: vec![SourceMaterial {
                base_color_factor: [0.2, 0.4, 0.6, 1.0],
                base_color_image: Some(0),
            }],
            images: vec![crate::asset::SourceImage::Uri("missing.png".into())],
            is_vrm: true,
            ..Default::default()
        };

        let prepared = prepare_asset(asset);
        assert_eq!(prepared.meshes.len(), 2);
        assert_eq!(prepared.meshes[0].base_color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(prepared.meshes[0].texture, TextureSlot::Default);
        assert_eq!(prepared.meshes[1].base_color, [1.0; 4]);
        assert!(prepared.textures.is_empty());
        assert_eq!(prepared.failed_textures, 1);
        assert!(prepared.is_vrm);
        assert!((prepared.bounds.radius() - 3f32.sqrt() * 0.5).abs() < 1e-6);
    }
}
