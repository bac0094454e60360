//! Geometry baking: node transforms applied to raw primitive streams
//!
//! Produces world-space vertices so the renderer can draw every mesh with an
//! identity model matrix.

use glam::{Mat3, Mat4, Vec3};
use tracing::{debug, warn};
use vrmview_core::Bounds;

use crate::asset::SourceAsset;
use crate::mesh::{BakedPrimitive, SourcePrimitive, Topology, Vertex};

/// Transformed normals shorter than this are replaced by +Y.
pub const NORMAL_EPSILON: f32 = 1e-4;

const UP: [f32; 3] = [0.0, 1.0, 0.0];
const ZERO_UV: [f32; 2] = [0.0, 0.0];

/// Why a primitive was left out of the baked model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Points, lines, strips and fans are not drawn.
    UnsupportedTopology(Topology),
    /// No position stream, or an empty one.
    MissingPositions,
    /// An index stream is present but empty.
    EmptyIndices,
    /// An index points past the end of the vertex stream.
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Result of baking every mesh-bearing node of an asset.
#[derive(Debug, Clone, Default)]
pub struct BakeOutput {
    pub primitives: Vec<BakedPrimitive>,
    /// Union of all baked positions.
    pub bounds: Bounds,
    /// Primitives dropped for one of the [`SkipReason`]s.
    pub skipped: usize,
}

/// Bake every primitive of every mesh-bearing node, in node order.
pub fn bake_asset(asset: &SourceAsset) -> BakeOutput {
    let mut output = BakeOutput::default();

    for node in &asset.nodes {
        let Some(mesh) = node.mesh.and_then(|index| asset.meshes.get(index)) else {
            continue;
        };

        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            match bake_primitive(primitive, node.world, &mut output.bounds) {
                Ok(baked) => output.primitives.push(baked),
                Err(reason) => {
                    output.skipped += 1;
                    match reason {
                        SkipReason::UnsupportedTopology(topology) => debug!(
                            "Skipping primitive {} of mesh '{}': {:?} topology",
                            primitive_index, mesh.name, topology
                        ),
                        other => warn!(
                            "Skipping primitive {} of mesh '{}': {:?}",
                            primitive_index, mesh.name, other
                        ),
                    }
                }
            }
        }
    }

    output
}

/// Bake one primitive with the owning node's world matrix.
///
/// Positions are accumulated into `bounds` only when the primitive is kept.
pub fn bake_primitive(
    primitive: &SourcePrimitive,
    world: Mat4,
    bounds: &mut Bounds,
) -> Result<BakedPrimitive, SkipReason> {
    if primitive.topology != Topology::Triangles {
        return Err(SkipReason::UnsupportedTopology(primitive.topology));
    }

    let positions = match primitive.positions.as_deref() {
        Some(positions) if !positions.is_empty() => positions,
        _ => return Err(SkipReason::MissingPositions),
    };
    let vertex_count = positions.len();

    if let Some(indices) = &primitive.indices {
        if indices.is_empty() {
            return Err(SkipReason::EmptyIndices);
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(SkipReason::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
    }

    let normal_matrix = Mat3::from_mat4(world);
    let normals = primitive.normals.as_deref().unwrap_or(&[]);
    let tex_coords = primitive.tex_coords.as_deref().unwrap_or(&[]);

    let mut vertices = Vec::with_capacity(vertex_count);
    for (i, position) in positions.iter().enumerate() {
        let world_position = world.transform_point3(Vec3::from_array(*position));
        bounds.include(world_position);

        let normal = match normals.get(i) {
            Some(normal) => bake_normal(normal_matrix, Vec3::from_array(*normal)).to_array(),
            None => UP,
        };
        let uv = tex_coords.get(i).copied().unwrap_or(ZERO_UV);

        vertices.push(Vertex::new(world_position.to_array(), normal, uv));
    }

    Ok(BakedPrimitive {
        vertices,
        indices: primitive.indices.clone(),
        material: primitive.material,
    })
}

/// Transform a normal by the upper 3x3 of the node matrix and renormalize.
///
/// Degenerate results (zero input, collapsed scale) become +Y.
pub fn bake_normal(normal_matrix: Mat3, normal: Vec3) -> Vec3 {
    let transformed = normal_matrix * normal;
    let length = transformed.length();
    if length > NORMAL_EPSILON && length.is_finite() {
        transformed / length
    } else {
        Vec3::Y
    }
}
