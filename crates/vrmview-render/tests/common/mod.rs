//! Writes small glTF/GLB files to a throwaway directory.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// A uniquely named directory under the system temp dir, removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("vrmview-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.0.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

#[derive(Default)]
pub struct GltfBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    nodes: Vec<Value>,
    materials: Vec<Value>,
    images: Vec<Value>,
    textures: Vec<Value>,
    extensions_used: Vec<String>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        let view = self.push_view(bytemuck::cast_slice(positions));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": positions.len(),
            "type": "VEC3",
            "min": min,
            "max": max,
        }))
    }

    pub fn normals(&mut self, normals: &[[f32; 3]]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(normals));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": normals.len(),
            "type": "VEC3",
        }))
    }

    pub fn tex_coords(&mut self, uvs: &[[f32; 2]]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(uvs));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": uvs.len(),
            "type": "VEC2",
        }))
    }

    pub fn indices(&mut self, indices: &[u32]) -> usize {
        self.index_accessor(bytemuck::cast_slice(indices), 5125, indices.len())
    }

    pub fn indices_u16(&mut self, indices: &[u16]) -> usize {
        self.index_accessor(bytemuck::cast_slice(indices), 5123, indices.len())
    }

    pub fn indices_u8(&mut self, indices: &[u8]) -> usize {
        self.index_accessor(indices, 5121, indices.len())
    }

    fn index_accessor(&mut self, bytes: &[u8], component_type: u32, count: usize) -> usize {
        let view = self.push_view(bytes);
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": "SCALAR",
        }))
    }

    /// An indexed quad primitive in the XY plane, normals facing +Z.
    pub fn quad_primitive(&mut self, material: Option<usize>) -> Value {
        let position = self.positions(&QUAD_POSITIONS);
        let normal = self.normals(&[[0.0, 0.0, 1.0]; 4]);
        let uv = self.tex_coords(&[[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);
        let indices = self.indices(&QUAD_INDICES);
        let mut primitive = json!({
            "attributes": { "POSITION": position, "NORMAL": normal, "TEXCOORD_0": uv },
            "indices": indices,
        });
        if let Some(material) = material {
            primitive["material"] = json!(material);
        }
        primitive
    }

    pub fn mesh(&mut self, primitives: Vec<Value>) -> usize {
        self.meshes.push(json!({ "primitives": primitives }));
        self.meshes.len() - 1
    }

    pub fn node(&mut self, node: Value) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn material(&mut self, base_color: [f32; 4], texture: Option<usize>) -> usize {
        let mut pbr = json!({ "baseColorFactor": base_color });
        if let Some(texture) = texture {
            pbr["baseColorTexture"] = json!({ "index": texture });
        }
        self.materials.push(json!({ "pbrMetallicRoughness": pbr }));
        self.materials.len() - 1
    }

    /// Adds an image with a relative URI and a texture sampling it; returns the texture index.
    pub fn external_image(&mut self, uri: &str) -> usize {
        self.images.push(json!({ "uri": uri }));
        self.texture_for_last_image()
    }

    /// Adds an image stored in the binary buffer; returns the texture index.
    pub fn embedded_image(&mut self, bytes: &[u8]) -> usize {
        let view = self.push_view(bytes);
        self.images.push(json!({ "bufferView": view, "mimeType": "image/png" }));
        self.texture_for_last_image()
    }

    fn texture_for_last_image(&mut self) -> usize {
        self.textures.push(json!({ "source": self.images.len() - 1 }));
        self.textures.len() - 1
    }

    pub fn vrm(&mut self) {
        self.extensions_used.push("VRMC_vrm".into());
    }

    fn document(&self, buffer: Value) -> Value {
        let mut root = json!({
            "asset": { "version": "2.0" },
            "buffers": [buffer],
            "bufferViews": self.buffer_views,
            "accessors": self.accessors,
            "meshes": self.meshes,
            "nodes": self.nodes,
        });
        if !self.materials.is_empty() {
            root["materials"] = json!(self.materials);
        }
        if !self.images.is_empty() {
            root["images"] = json!(self.images);
            root["textures"] = json!(self.textures);
        }
        if !self.extensions_used.is_empty() {
            root["extensionsUsed"] = json!(self.extensions_used);
        }
        root
    }

    /// Writes `<name>.gltf` and `<name>.bin`; returns the `.gltf` path.
    pub fn write_gltf(&self, dir: &TempDir, name: &str) -> PathBuf {
        let bin_name = format!("{name}.bin");
        dir.write(&bin_name, &self.bin);
        let document = self.document(json!({ "uri": bin_name, "byteLength": self.bin.len() }));
        dir.write(&format!("{name}.gltf"), &serde_json::to_vec_pretty(&document).unwrap())
    }

    /// Writes a single binary container named `file_name`.
    pub fn write_glb(&self, dir: &TempDir, file_name: &str) -> PathBuf {
        let document = self.document(json!({ "byteLength": self.bin.len() }));
        let mut json_chunk = serde_json::to_vec(&document).unwrap();
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }
        let mut bin_chunk = self.bin.clone();
        while bin_chunk.len() % 4 != 0 {
            bin_chunk.push(0);
        }

        let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json_chunk);
        glb.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin_chunk);
        dir.write(file_name, &glb)
    }
}
