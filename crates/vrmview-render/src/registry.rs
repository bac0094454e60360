//! Ownership of the currently displayed model's GPU resources.

use std::path::{Path, PathBuf};

use glam::Vec3;
use tracing::{debug, info, warn};
use vrmview_assets::{prepare_model, AssetError, PreparedModel, TextureSlot};

use crate::backend::{GpuBackend, GpuError};
use crate::default_texture::DefaultTexture;
use crate::handle::{BufferHandle, TextureHandle, ViewHandle};

/// Why a model could not be installed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("GPU upload failed: {0}")]
    Gpu(#[from] GpuError),
}

/// One drawable unit on the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMesh {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    pub vertex_count: u32,
    /// Zero when the mesh is drawn non-indexed.
    pub index_count: u32,
    pub texture: TextureHandle,
    pub texture_view: ViewHandle,
    pub base_color: [f32; 4],
    /// True when `texture` belongs to the model rather than being the shared default.
    pub owns_texture: bool,
}

impl RenderMesh {
    pub fn has_indices(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Number of vertices the draw call consumes.
    pub fn draw_count(&self) -> u32 {
        if self.has_indices() {
            self.index_count
        } else {
            self.vertex_count
        }
    }
}

/// A texture uploaded for one model, shared by every mesh that samples it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTexture {
    pub texture: TextureHandle,
    pub view: ViewHandle,
}

/// The model currently on screen.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub source: PathBuf,
    pub meshes: Vec<RenderMesh>,
    pub textures: Vec<ModelTexture>,
    pub center: Vec3,
    pub radius: f32,
    pub is_vrm: bool,
    pub skipped_primitives: usize,
    pub failed_textures: usize,
}

/// What the caller needs after a successful load, e.g. to re-frame the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub source: PathBuf,
    pub mesh_count: usize,
    pub texture_count: usize,
    pub failed_textures: usize,
    pub skipped_primitives: usize,
    pub center: Vec3,
    pub radius: f32,
    pub is_vrm: bool,
}

impl LoadSummary {
    fn of(model: &Model) -> Self {
        Self {
            source: model.source.clone(),
            mesh_count: model.meshes.len(),
            texture_count: model.textures.len(),
            failed_textures: model.failed_textures,
            skipped_primitives: model.skipped_primitives,
            center: model.center,
            radius: model.radius,
            is_vrm: model.is_vrm,
        }
    }
}

/// Holds at most one model plus the shared default texture.
#[derive(Debug)]
pub struct SceneRegistry {
    default_texture: DefaultTexture,
    model: Option<Model>,
}

impl SceneRegistry {
    /// Create the registry and its default texture.
    pub fn new(backend: &mut impl GpuBackend) -> Result<Self, GpuError> {
        Ok(Self::with_default_texture(DefaultTexture::create(backend)?))
    }

    pub fn with_default_texture(default_texture: DefaultTexture) -> Self {
        Self {
            default_texture,
            model: None,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn default_texture(&self) -> DefaultTexture {
        self.default_texture
    }

    /// Load a model file and make it the current model.
    ///
    /// Parsing and baking happen before anything is released, so a file that
    /// fails to parse leaves the current model on screen.
    pub fn load(&mut self, backend: &mut impl GpuBackend, path: &Path) -> Result<LoadSummary, LoadError> {
        info!("Loading model: {}", path.display());
        let prepared = match prepare_model(path) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!("Keeping current model, load failed: {}", err);
                return Err(err.into());
            }
        };
        self.install(backend, prepared)
    }

    /// Replace the current model with an already prepared one.
    ///
    /// If GPU creation fails partway, everything created for the new model is
    /// released again and the registry is left empty.
    pub fn install(
        &mut self,
        backend: &mut impl GpuBackend,
        prepared: PreparedModel,
    ) -> Result<LoadSummary, LoadError> {
        self.clear(backend);

        let mut model = Model {
            source: prepared.source.clone(),
            center: prepared.bounds.center(),
            radius: prepared.bounds.radius(),
            is_vrm: prepared.is_vrm,
            skipped_primitives: prepared.skipped_primitives,
            failed_textures: prepared.failed_textures,
            ..Default::default()
        };

        if let Err(err) = self.upload(backend, &prepared, &mut model) {
            warn!("Upload of '{}' failed, releasing partial model: {}", prepared.source.display(), err);
            release_model(backend, model);
            return Err(err.into());
        }

        let summary = LoadSummary::of(&model);
        info!(
            "Loaded '{}': {} meshes, {} textures, center {:?}, radius {:.3}",
            summary.source.display(),
            summary.mesh_count,
            summary.texture_count,
            summary.center,
            summary.radius
        );
        self.model = Some(model);
        Ok(summary)
    }

    fn upload(
        &self,
        backend: &mut impl GpuBackend,
        prepared: &PreparedModel,
        model: &mut Model,
    ) -> Result<(), GpuError> {
        for (index, asset) in prepared.textures.iter().enumerate() {
            let label = format!("{} texture {}", prepared.source.display(), index);
            let texture = backend.create_texture(asset, &label)?;
            let view = match backend.create_texture_view(texture) {
                Ok(view) => view,
                Err(err) => {
                    backend.destroy_texture(texture);
                    return Err(err);
                }
            };
            model.textures.push(ModelTexture { texture, view });
        }

        for (index, mesh) in prepared.meshes.iter().enumerate() {
            let vertex_count = count_u32(mesh.vertices.len())?;
            let index_count = count_u32(mesh.indices.as_ref().map_or(0, Vec::len))?;

            let vertex_buffer = backend.create_vertex_buffer(&mesh.vertices)?;
            let index_buffer = match &mesh.indices {
                Some(indices) => match backend.create_index_buffer(indices) {
                    Ok(buffer) => Some(buffer),
                    Err(err) => {
                        backend.destroy_buffer(vertex_buffer);
                        return Err(err);
                    }
                },
                None => None,
            };

            let owned = match mesh.texture {
                TextureSlot::Loaded(slot) => model.textures.get(slot).copied(),
                TextureSlot::Default => None,
            };
            let (texture, texture_view) = owned
                .map(|t| (t.texture, t.view))
                .unwrap_or((self.default_texture.texture, self.default_texture.view));

            debug!(
                "Mesh {}: {} vertices, {} indices, textured: {}",
                index,
                vertex_count,
                index_count,
                owned.is_some()
            );

            model.meshes.push(RenderMesh {
                vertex_buffer,
                index_buffer,
                vertex_count,
                index_count,
                texture,
                texture_view,
                base_color: mesh.base_color,
                owns_texture: owned.is_some(),
            });
        }
        Ok(())
    }

    /// Release the current model, if any. The default texture survives.
    pub fn clear(&mut self, backend: &mut impl GpuBackend) {
        if let Some(model) = self.model.take() {
            debug!("Releasing model '{}'", model.source.display());
            release_model(backend, model);
        }
    }

    /// Release the model and the default texture.
    pub fn shutdown(mut self, backend: &mut impl GpuBackend) {
        self.clear(backend);
        self.default_texture.destroy(backend);
        info!("Scene registry shut down");
    }
}

fn release_model(backend: &mut impl GpuBackend, model: Model) {
    for mesh in &model.meshes {
        backend.destroy_buffer(mesh.vertex_buffer);
        if let Some(index_buffer) = mesh.index_buffer {
            backend.destroy_buffer(index_buffer);
        }
    }
    for texture in &model.textures {
        backend.destroy_texture_view(texture.view);
        backend.destroy_texture(texture.texture);
    }
}

fn count_u32(count: usize) -> Result<u32, GpuError> {
    u32::try_from(count).map_err(|_| GpuError::Backend(format!("element count {count} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use vrmview_assets::{PreparedMesh, TextureAsset, Vertex};
    use vrmview_core::Bounds;

    fn mesh(indexed: bool, texture: TextureSlot) -> PreparedMesh {
        PreparedMesh {
            vertices: vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([2.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([0.0, 2.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            indices: indexed.then(|| vec![0, 1, 2]),
            base_color: [1.0, 0.5, 0.25, 1.0],
            texture,
        }
    }

    fn prepared(meshes: Vec<PreparedMesh>, textures: usize) -> PreparedModel {
        let mut bounds = Bounds::empty();
        bounds.include(glam::Vec3::ZERO);
        bounds.include(glam::Vec3::new(2.0, 2.0, 0.0));
        PreparedModel {
            source: PathBuf::from("test.gltf"),
            meshes,
            textures: (0..textures).map(|_| TextureAsset::solid(1, 1, [255, 0, 0, 255])).collect(),
            bounds,
            is_vrm: false,
            skipped_primitives: 0,
            failed_textures: 0,
        }
    }

    #[test]
    fn test_install_shares_textures_between_meshes() {
        let mut backend = HeadlessBackend::new();
        let mut registry = SceneRegistry::new(&mut backend).unwrap();

        let summary = registry
            .install(
                &mut backend,
                prepared(
                    vec![
                        mesh(true, TextureSlot::Loaded(0)),
                        mesh(false, TextureSlot::Loaded(0)),
                        mesh(true, TextureSlot::Default),
                    ],
                    1,
                ),
            )
            .unwrap();

        assert_eq!(summary.mesh_count, 3);
        assert_eq!(summary.texture_count, 1);
        assert_eq!(summary.center, Vec3::new(1.0, 1.0, 0.0));

        let model = registry.model().unwrap();
        assert_eq!(model.meshes[0].texture, model.meshes[1].texture);
        assert!(model.meshes[0].owns_texture);
        assert!(!model.meshes[1].has_indices());
        assert_eq!(model.meshes[1].draw_count(), 3);
        assert_eq!(model.meshes[2].texture, registry.default_texture().texture);
        assert!(!model.meshes[2].owns_texture);

        // default + model texture, 5 buffers (2 indexed meshes)
        assert_eq!(backend.live_textures(), 2);
        assert_eq!(backend.live_buffers(), 5);
    }

    #[test]
    fn test_reinstall_releases_previous_model_once() {
        let mut backend = HeadlessBackend::new();
        let mut registry = SceneRegistry::new(&mut backend).unwrap();

        registry
            .install(&mut backend, prepared(vec![mesh(true, TextureSlot::Loaded(0))], 1))
            .unwrap();
        registry
            .install(&mut backend, prepared(vec![mesh(false, TextureSlot::Default)], 0))
            .unwrap();

        assert_eq!(backend.live_buffers(), 1);
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.live_views(), 1);
        assert_eq!(backend.unknown_destroys(), 0);
    }

    #[test]
    fn test_gpu_failure_leaves_registry_empty() {
        // default texture + view, then one texture + view, then fail on the first buffer
        let mut backend = HeadlessBackend::new().fail_after(4);
        let mut registry = SceneRegistry::new(&mut backend).unwrap();

        let result = registry.install(&mut backend, prepared(vec![mesh(true, TextureSlot::Loaded(0))], 1));
        assert!(matches!(result, Err(LoadError::Gpu(_))));
        assert!(registry.model().is_none());
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.live_views(), 1);
    }

    #[test]
    fn test_index_buffer_failure_releases_vertex_buffer() {
        // default texture + view, vertex buffer, then the index buffer fails
        let mut backend = HeadlessBackend::new().fail_after(3);
        let mut registry = SceneRegistry::new(&mut backend).unwrap();

        let result = registry.install(&mut backend, prepared(vec![mesh(true, TextureSlot::Default)], 0));
        assert!(result.is_err());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_load_missing_file_keeps_current_model() {
        let mut backend = HeadlessBackend::new();
        let mut registry = SceneRegistry::new(&mut backend).unwrap();
        registry
            .install(&mut backend, prepared(vec![mesh(true, TextureSlot::Default)], 0))
            .unwrap();

        let result = registry.load(&mut backend, Path::new("/nonexistent/model.glb"));
        assert!(matches!(result, Err(LoadError::Asset(AssetError::NotFound(_)))));
        assert_eq!(registry.model().unwrap().meshes.len(), 1);
        assert_eq!(backend.live_buffers(), 2);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut backend = HeadlessBackend::new();
        let mut registry = SceneRegistry::new(&mut backend).unwrap();
        registry
            .install(&mut backend, prepared(vec![mesh(true, TextureSlot::Loaded(0))], 1))
            .unwrap();

        registry.shutdown(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_views(), 0);
        assert_eq!(backend.unknown_destroys(), 0);
    }
}
