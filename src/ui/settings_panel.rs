//! Settings side panel

use egui::{Color32, FontId, RichText, Slider, Ui};
use vrmview_controls::{InputBinding, KeyBindings, ViewerAction};
use vrmview_render::scene::{EXPOSURE_MAX, EXPOSURE_MIN, LOD_MAX, LOD_MIN};
use vrmview_render::{LoadSummary, ShadingParams};

const PANEL_WIDTH: f32 = 280.0;
const ACCENT: Color32 = Color32::from_rgb(200, 200, 255);

/// Help rows in display order. Zoom has no binding and is listed after orbit.
const HELP_ACTIONS: [(ViewerAction, &str); 10] = [
    (ViewerAction::Orbit, "Drag to orbit"),
    (ViewerAction::ResetCamera, "Reset camera"),
    (ViewerAction::ToggleGui, "Toggle GUI"),
    (ViewerAction::ToggleSkybox, "Toggle skybox"),
    (ViewerAction::ToggleToon, "Toggle toon shading"),
    (ViewerAction::ExposureUp, "Exposure up"),
    (ViewerAction::ExposureDown, "Exposure down"),
    (ViewerAction::LodUp, "Sky LOD up"),
    (ViewerAction::LodDown, "Sky LOD down"),
    (ViewerAction::Quit, "Quit"),
];

/// What the panel shows about the loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub file_name: String,
    pub mesh_count: usize,
    pub texture_count: usize,
    pub skipped_primitives: usize,
    pub is_vrm: bool,
}

impl ModelInfo {
    pub fn type_label(&self) -> &'static str {
        if self.is_vrm {
            "VRM (Toon)"
        } else {
            "GLTF/GLB (PBR)"
        }
    }
}

impl From<&LoadSummary> for ModelInfo {
    fn from(summary: &LoadSummary) -> Self {
        Self {
            file_name: summary
                .source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mesh_count: summary.mesh_count,
            texture_count: summary.texture_count,
            skipped_primitives: summary.skipped_primitives,
            is_vrm: summary.is_vrm,
        }
    }
}

/// Result of one frame of the panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelResponse {
    /// Any shading parameter differs from the start of the frame
    pub shading_changed: bool,
    pub reset_camera: bool,
}

/// Left side panel with model info, environment and toon controls
#[derive(Debug)]
pub struct SettingsPanel {
    help: Vec<String>,
}

impl SettingsPanel {
    /// The Controls section lists whatever `bindings` maps each action to.
    pub fn new(bindings: &KeyBindings) -> Self {
        Self {
            help: help_lines(bindings),
        }
    }

    /// Build the panel for this frame, editing `shading` in place.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        shading: &mut ShadingParams,
        model: Option<&ModelInfo>,
        fps: f32,
    ) -> PanelResponse {
        let before = *shading;
        let mut response = PanelResponse::default();

        egui::SidePanel::left("settings_panel")
            .exact_width(PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(
                    RichText::new("VRM Viewer")
                        .font(FontId::proportional(22.0))
                        .color(ACCENT),
                );
                ui.label(RichText::new(format!("{fps:.0} FPS")).small().weak());
                ui.separator();

                if let Some(model) = model {
                    section(ui, "Model Info", |ui| render_model_info(ui, model));
                }

                section(ui, "Environment", |ui| render_environment(ui, shading));

                if shading.toon_enabled || model.is_some_and(|m| m.is_vrm) {
                    section(ui, "Toon Shading", |ui| render_toon(ui, shading));
                }

                let help = &self.help;
                section(ui, "Controls", |ui| {
                    for line in help {
                        ui.label(RichText::new(line).small());
                    }
                });

                ui.add_space(8.0);
                if ui.button("Reset camera").clicked() {
                    response.reset_camera = true;
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Drop VRM/GLTF/GLB to load").weak());
                });
            });

        response.shading_changed = *shading != before;
        response
    }
}

fn section(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.add_space(6.0);
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(title).strong().color(ACCENT));
        ui.add_space(4.0);
        body(ui);
    });
}

fn render_model_info(ui: &mut Ui, model: &ModelInfo) {
    egui::Grid::new("model_info").num_columns(2).show(ui, |ui| {
        ui.label("File:");
        ui.label(&model.file_name);
        ui.end_row();
        ui.label("Meshes:");
        ui.label(model.mesh_count.to_string());
        ui.end_row();
        ui.label("Textures:");
        ui.label(model.texture_count.to_string());
        ui.end_row();
        ui.label("Type:");
        ui.label(model.type_label());
        ui.end_row();
        if model.skipped_primitives > 0 {
            ui.label("Skipped:");
            ui.label(format!("{} primitives", model.skipped_primitives));
            ui.end_row();
        }
    });
}

fn render_environment(ui: &mut Ui, shading: &mut ShadingParams) {
    ui.checkbox(&mut shading.skybox_enabled, "Skybox");
    ui.horizontal(|ui| {
        ui.label("Exposure:");
        ui.add(Slider::new(&mut shading.exposure, EXPOSURE_MIN..=EXPOSURE_MAX).fixed_decimals(2));
    });
    ui.horizontal(|ui| {
        ui.label("LOD:");
        ui.add(Slider::new(&mut shading.sky_lod, LOD_MIN..=LOD_MAX).fixed_decimals(1));
    });
}

fn render_toon(ui: &mut Ui, shading: &mut ShadingParams) {
    ui.checkbox(&mut shading.toon_enabled, "Enabled");
    let sliders: [(&str, &mut f32, f32); 6] = [
        ("Light Intensity", &mut shading.toon_light_intensity, 2.0),
        ("Shade Toony", &mut shading.shade_toony, 1.0),
        ("Shade Strength", &mut shading.shade_strength, 1.0),
        ("Rim Threshold", &mut shading.rim_threshold, 1.0),
        ("Rim Softness", &mut shading.rim_softness, 1.0),
        ("Spec Intensity", &mut shading.spec_intensity, 1.0),
    ];
    egui::Grid::new("toon_params").num_columns(2).show(ui, |ui| {
        for (label, value, max) in sliders {
            ui.label(label);
            ui.add(Slider::new(value, 0.0..=max).fixed_decimals(2));
            ui.end_row();
        }
    });
}

fn help_lines(bindings: &KeyBindings) -> Vec<String> {
    let mut lines = Vec::new();
    for (action, description) in HELP_ACTIONS {
        let inputs = bindings.bindings_for(action);
        if !inputs.is_empty() {
            let keys: Vec<String> = inputs.iter().map(InputBinding::label).collect();
            lines.push(format!("{}: {}", keys.join(" / "), description));
        }
        if action == ViewerAction::Orbit {
            lines.push("Scroll: Zoom".to_string());
        }
    }
    lines
}
