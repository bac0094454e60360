//! Vertex and primitive types shared by the loader, the baker and the renderer

use bytemuck::{Pod, Zeroable};

/// World-space vertex as uploaded to the GPU: position, normal, uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Primitive topology as declared by the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl From<gltf::mesh::Mode> for Topology {
    fn from(mode: gltf::mesh::Mode) -> Self {
        use gltf::mesh::Mode;
        match mode {
            Mode::Points => Topology::Points,
            Mode::Lines => Topology::Lines,
            Mode::LineLoop => Topology::LineLoop,
            Mode::LineStrip => Topology::LineStrip,
            Mode::Triangles => Topology::Triangles,
            Mode::TriangleStrip => Topology::TriangleStrip,
            Mode::TriangleFan => Topology::TriangleFan,
        }
    }
}

/// A mesh as read from the source file (local space, not yet baked).
#[derive(Debug, Clone)]
pub struct SourceMesh {
    pub name: String,
    pub primitives: Vec<SourcePrimitive>,
}

/// A single primitive's resolved accessor streams.
#[derive(Debug, Clone)]
pub struct SourcePrimitive {
    pub topology: Topology,
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Index stream widened to u32 regardless of the source component type.
    pub indices: Option<Vec<u32>>,
    pub material: Option<usize>,
}

impl SourcePrimitive {
    /// A triangle-list primitive with only positions, mostly useful in tests.
    pub fn triangles(positions: Vec<[f32; 3]>) -> Self {
        Self {
            topology: Topology::Triangles,
            positions: Some(positions),
            normals: None,
            tex_coords: None,
            indices: None,
            material: None,
        }
    }
}

/// Output of the baker for one primitive.
#[derive(Debug, Clone)]
pub struct BakedPrimitive {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
    pub material: Option<usize>,
}

impl BakedPrimitive {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> Option<usize> {
        self.indices.as_ref().map(Vec::len)
    }
}
