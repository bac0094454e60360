//! Viewer application: window, event handling and the per-frame loop

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use egui_winit_vulkano::{Gui, GuiConfig};
use tracing::{debug, error, info, warn};
use vrmview_controls::{InputHandler, OrbitCamera, ViewerAction};
use vrmview_core::{FrameTimer, TimerConfig};
use vrmview_render::{
    plan_frame, CameraMatrices, SceneLighting, SceneRegistry, SkyColors, VulkanRenderer,
    CLIP_CORRECTION,
};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{CursorIcon, Window, WindowId},
};

use crate::settings::ViewerSettings;
use crate::ui::{ModelInfo, PanelResponse, SettingsPanel};

const WINDOW_TITLE: &str = "VRM/GLTF/GLB Viewer";

/// Everything that needs a live device
struct GpuState {
    renderer: VulkanRenderer,
    registry: SceneRegistry,
    gui: Gui,
}

pub struct ViewerApp {
    settings: ViewerSettings,
    initial_path: Option<PathBuf>,
    gpu: Option<GpuState>,
    camera: OrbitCamera,
    input: InputHandler,
    timer: FrameTimer,
    last_frame: Instant,
    lighting: SceneLighting,
    sky: SkyColors,
    panel: SettingsPanel,
    model_info: Option<ModelInfo>,
    pending_drop: Option<PathBuf>,
    /// Settings differ from what is on disk
    settings_dirty: bool,
    /// The grab cursor is showing
    grab_cursor: bool,
}

impl ViewerApp {
    pub fn new(settings: ViewerSettings, initial_path: Option<PathBuf>) -> Self {
        let camera = OrbitCamera::with_config(settings.camera.clone());
        let input = InputHandler::new();
        let panel = SettingsPanel::new(&input.bindings);
        Self {
            settings,
            initial_path,
            gpu: None,
            camera,
            input,
            timer: FrameTimer::new(TimerConfig::default()),
            last_frame: Instant::now(),
            lighting: SceneLighting::default(),
            sky: SkyColors::default(),
            panel,
            model_info: None,
            pending_drop: None,
            settings_dirty: false,
            grab_cursor: false,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(
                self.settings.window.width,
                self.settings.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let mut renderer = VulkanRenderer::new(event_loop, window)?;
        let registry = SceneRegistry::new(renderer.resources_mut())?;
        let gui = Gui::new(
            event_loop,
            renderer.surface(),
            renderer.queue(),
            renderer.output_format(),
            GuiConfig {
                allow_srgb_render_target: true,
                is_overlay: true,
                ..Default::default()
            },
        );

        self.gpu = Some(GpuState {
            renderer,
            registry,
            gui,
        });
        Ok(())
    }

    /// Replace the current model. Failures are logged and leave the old model
    /// in place.
    fn load_model(&mut self, path: &Path) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        match gpu.registry.load(gpu.renderer.resources_mut(), path) {
            Ok(summary) => {
                self.camera.reset(summary.center, summary.radius);
                self.settings.shading.toon_enabled = summary.is_vrm;
                self.model_info = Some(ModelInfo::from(&summary));
                info!(
                    "Loaded {}: {} meshes, {} textures",
                    path.display(),
                    summary.mesh_count,
                    summary.texture_count
                );
            }
            Err(err) => error!("Failed to load {}: {}", path.display(), err),
        }
    }

    /// Re-frame the loaded model. Does nothing while no model is loaded.
    fn reset_camera(&mut self) {
        let framing = self
            .gpu
            .as_ref()
            .and_then(|gpu| gpu.registry.model())
            .map(|model| (model.center, model.radius));
        if let Some((center, radius)) = framing {
            self.camera.reset(center, radius);
        }
    }

    fn apply_panel_response(&mut self, response: PanelResponse) {
        if response.shading_changed {
            self.settings_dirty = true;
            debug!("Shading changed: {:?}", self.settings.shading);
        }
        if response.reset_camera {
            self.reset_camera();
        }
    }

    /// Apply this frame's key actions. Returns true when quit was requested.
    fn apply_actions(&mut self) -> bool {
        let state = &self.input.state;
        let pressed = |action| state.is_just_pressed(action);

        let quit = pressed(ViewerAction::Quit);
        let reset = pressed(ViewerAction::ResetCamera);
        let before = self.settings.shading;
        let shading = &mut self.settings.shading;
        if pressed(ViewerAction::ToggleGui) {
            self.settings.show_gui = !self.settings.show_gui;
        }
        if pressed(ViewerAction::ToggleSkybox) {
            shading.skybox_enabled = !shading.skybox_enabled;
        }
        if pressed(ViewerAction::ToggleToon) {
            shading.toon_enabled = !shading.toon_enabled;
            info!("Toon shading: {}", shading.toon_enabled);
        }
        if pressed(ViewerAction::ExposureUp) {
            shading.step_exposure(1.0);
        }
        if pressed(ViewerAction::ExposureDown) {
            shading.step_exposure(-1.0);
        }
        if pressed(ViewerAction::LodUp) {
            shading.step_lod(1.0);
        }
        if pressed(ViewerAction::LodDown) {
            shading.step_lod(-1.0);
        }
        let shading_changed = *shading != before;
        self.apply_panel_response(PanelResponse {
            shading_changed,
            reset_camera: reset,
        });
        quit
    }

    fn update_cursor(&mut self, window: &Window) {
        let dragging = self.camera.is_dragging();
        if dragging != self.grab_cursor {
            self.grab_cursor = dragging;
            window.set_cursor(if dragging { CursorIcon::Grabbing } else { CursorIcon::Default });
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.timer.update((now - self.last_frame).as_secs_f32());
        self.last_frame = now;

        if let Some(path) = self.pending_drop.take() {
            self.load_model(&path);
        }

        if self.apply_actions() {
            event_loop.exit();
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let pointer_over_ui = self.settings.show_gui && {
            let ctx = gpu.gui.context();
            ctx.is_pointer_over_area() || ctx.wants_pointer_input()
        };
        self.camera.update(&self.input.state, pointer_over_ui);
        let window = gpu.renderer.window().clone();
        self.update_cursor(&window);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let mut response = PanelResponse::default();
        if self.settings.show_gui {
            let shading = &mut self.settings.shading;
            let model_info = self.model_info.as_ref();
            let panel = &mut self.panel;
            let fps = self.timer.fps();
            gpu.gui.immediate_ui(|gui| {
                let ctx = gui.context();
                response = panel.show(&ctx, shading, model_info, fps);
            });
        }
        self.input.end_frame();
        self.apply_panel_response(response);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let camera = CameraMatrices {
            view: self.camera.view_matrix(),
            projection: CLIP_CORRECTION * self.camera.projection_matrix(gpu.renderer.aspect_ratio()),
            eye: self.camera.eye_position(),
        };
        let plan = plan_frame(
            gpu.registry.model(),
            &camera,
            &self.lighting,
            &self.sky,
            &self.settings.shading,
        );

        let gui = &mut gpu.gui;
        let result = if self.settings.show_gui {
            gpu.renderer
                .render(&plan, |future, image| gui.draw_on_image(future, image))
        } else {
            gpu.renderer.render(&plan, |future, _| future)
        };
        if let Err(err) = result {
            error!("Frame failed: {}", err);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(err) = self.init_gpu(event_loop) {
            error!("Failed to initialize renderer: {:#}", err);
            event_loop.exit();
            return;
        }
        if let Some(path) = self.initial_path.take() {
            self.load_model(&path);
        }
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let Some(gpu) = self.gpu.as_mut() {
            if self.settings.show_gui {
                gpu.gui.update(&event);
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.renderer.request_resize();
                }
            }
            WindowEvent::DroppedFile(path) => {
                // Several files dropped at once arrive as separate events.
                if self.pending_drop.is_none() {
                    self.pending_drop = Some(path);
                } else {
                    warn!("Ignoring extra dropped file: {}", path.display());
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if !event.repeat {
                    self.input.handle_keyboard(event.physical_key, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.handle_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.handle_scroll(delta);
            }
            WindowEvent::Focused(false) => self.input.state.clear_all(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = self.gpu.as_ref() {
            gpu.renderer.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.settings.camera = self.camera.config.clone();
        if let Some(gpu) = self.gpu.as_ref() {
            let window = gpu.renderer.window();
            let size = window.inner_size().to_logical::<u32>(window.scale_factor());
            let resized = size.width != self.settings.window.width || size.height != self.settings.window.height;
            if size.width > 0 && size.height > 0 && resized {
                self.settings.window.width = size.width;
                self.settings.window.height = size.height;
                self.settings_dirty = true;
            }
        }
        if self.settings_dirty {
            if let Err(err) = self.settings.save() {
                warn!("Failed to save settings: {:#}", err);
            }
        }

        if let Some(mut gpu) = self.gpu.take() {
            gpu.renderer.finish_frames();
            gpu.registry.shutdown(gpu.renderer.resources_mut());
        }
        info!("Viewer shut down");
    }
}
