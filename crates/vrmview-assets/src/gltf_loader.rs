//! glTF/GLB/VRM parsing into a transient source asset

use std::path::Path;

use glam::Mat4;
use tracing::{debug, info};

use crate::asset::{SourceAsset, SourceImage, SourceMaterial, SourceNode};
use crate::error::AssetError;
use crate::mesh::{SourceMesh, SourcePrimitive};

/// Extension names that mark a file as a VRM avatar (0.x and 1.0).
const VRM_EXTENSIONS: [&str; 2] = ["VRM", "VRMC_vrm"];

/// Load a glTF 2.0 file (.gltf, .glb or .vrm) into a transient [`SourceAsset`].
///
/// Images are not decoded here; a broken or missing texture must not fail the
/// whole load, so decoding is left to the material resolver.
pub fn load_asset(path: &Path) -> Result<SourceAsset, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
        .map_err(|e| AssetError::ParseFailed(path.to_path_buf(), e))?;

    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let buffers: Vec<Vec<u8>> = gltf::import_buffers(&document, Some(&base_dir), blob)
        .map_err(|e| AssetError::BufferLoadFailed(path.to_path_buf(), e))?
        .into_iter()
        .map(|data| data.0)
        .collect();

    let worlds = world_transforms(&document);
    let nodes = document
        .nodes()
        .map(|node| SourceNode {
            name: node.name().map(str::to_string),
            world: worlds[node.index()],
            mesh: node.mesh().map(|mesh| mesh.index()),
        })
        .collect();

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let name = mesh.name().unwrap_or("unnamed").to_string();

        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            primitives.push(SourcePrimitive {
                topology: primitive.mode().into(),
                positions: reader.read_positions().map(|iter| iter.collect()),
                normals: reader.read_normals().map(|iter| iter.collect()),
                tex_coords: reader.read_tex_coords(0).map(|tc| tc.into_f32().collect()),
                indices: reader.read_indices().map(|idx| idx.into_u32().collect()),
                material: primitive.material().index(),
            });
        }

        debug!("Read mesh '{}' with {} primitives", name, primitives.len());
        meshes.push(SourceMesh { name, primitives });
    }

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            SourceMaterial {
                base_color_factor: pbr.base_color_factor(),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let images = document
        .images()
        .map(|image| match image.source() {
            gltf::image::Source::View { view, .. } => SourceImage::BufferView {
                buffer: view.buffer().index(),
                offset: view.offset(),
                length: view.length(),
            },
            gltf::image::Source::Uri { uri, .. } => SourceImage::Uri(uri.to_string()),
        })
        .collect::<Vec<_>>();

    let is_vrm = is_vrm_document(&document);

    info!(
        "Parsed '{}': {} nodes, {} meshes, {} images{}",
        path.display(),
        document.nodes().len(),
        meshes.len(),
        images.len(),
        if is_vrm { " (VRM)" } else { "" }
    );

    Ok(SourceAsset {
        path: path.to_path_buf(),
        base_dir,
        nodes,
        meshes,
        materials,
        images,
        buffers,
        is_vrm,
    })
}

/// True if the document declares one of the VRM extensions.
pub fn is_vrm_document(document: &gltf::Document) -> bool {
    document
        .extensions_used()
        .any(|name| VRM_EXTENSIONS.contains(&name))
}

/// Compose every node's local transform with its ancestors', indexed by node.
///
/// Nodes that are not reachable from any scene still get a world matrix, so
/// meshes referenced only by detached nodes are drawn as well.
pub fn world_transforms(document: &gltf::Document) -> Vec<Mat4> {
    let count = document.nodes().len();
    let mut parents: Vec<Option<usize>> = vec![None; count];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }

    let locals: Vec<Mat4> = document
        .nodes()
        .map(|node| Mat4::from_cols_array_2d(&node.transform().matrix()))
        .collect();

    let mut worlds: Vec<Option<Mat4>> = vec![None; count];
    for index in 0..count {
        // Walk up until a cached ancestor or the root; the length guard stops
        // malformed files with parent cycles.
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = parents[current] {
            if worlds[parent].is_some() || chain.len() > count {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        let mut world = parents[current]
            .and_then(|parent| worlds[parent])
            .unwrap_or(Mat4::IDENTITY);
        for &node in chain.iter().rev() {
            world = match worlds[node] {
                Some(cached) => cached,
                None => {
                    let composed = world * locals[node];
                    worlds[node] = Some(composed);
                    composed
                }
            };
        }
    }

    worlds
        .into_iter()
        .map(|world| world.unwrap_or(Mat4::IDENTITY))
        .collect()
}
