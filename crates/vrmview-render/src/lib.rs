//! vrmview render layer
//!
//! Owns everything between a prepared model and the screen: typed GPU handles,
//! the [`GpuBackend`] seam, the scene registry that uploads and releases a
//! model's resources, the pure per-frame draw plan, and the vulkano backend
//! that executes it.

pub mod backend;
pub mod default_texture;
pub mod frame;
pub mod handle;
pub mod headless;
pub mod registry;
pub mod scene;
pub mod shader_interface;
pub mod vertex;
pub mod vulkan;

pub use backend::{GpuBackend, GpuError};
pub use default_texture::DefaultTexture;
pub use frame::{plan_frame, CameraMatrices, DrawCall, FramePlan};
pub use handle::{BufferHandle, Handle, ResourceId, TextureHandle, ViewHandle};
pub use headless::{BackendEvent, HeadlessBackend};
pub use registry::{LoadError, LoadSummary, Model, ModelTexture, RenderMesh, SceneRegistry};
pub use scene::{SceneLighting, ShadingParams, SkyColors};
pub use shader_interface::{DrawConstants, FrameUniforms, SkyConstants};
pub use vertex::Vertex;
pub use vulkan::{VulkanRenderer, CLIP_CORRECTION};
