//! vrmview Assets - model loading and CPU-side preparation
//!
//! Parses glTF 2.0 / GLB / VRM files into a transient [`SourceAsset`], bakes
//! node transforms into flat world-space vertex arrays, and resolves each
//! primitive's material to a base color and a decoded RGBA8 texture.

mod asset;
mod bake;
mod error;
mod gltf_loader;
mod material;
mod mesh;
mod prepare;
mod texture;

pub use asset::{SourceAsset, SourceImage, SourceMaterial, SourceNode};
pub use bake::{bake_asset, bake_normal, bake_primitive, BakeOutput, SkipReason, NORMAL_EPSILON};
pub use error::AssetError;
pub use gltf_loader::{is_vrm_document, load_asset, world_transforms};
pub use material::{MaterialResolver, ResolvedMaterial, TextureSlot, DEFAULT_BASE_COLOR};
pub use mesh::{BakedPrimitive, SourceMesh, SourcePrimitive, Topology, Vertex};
pub use prepare::{prepare_asset, prepare_model, PreparedMesh, PreparedModel};
pub use texture::{decode_texture, load_texture, TextureAsset};
