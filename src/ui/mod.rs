//! UI module for vrmview
//!
//! egui panels drawn on top of the 3D view.

mod settings_panel;

pub use settings_panel::{ModelInfo, PanelResponse, SettingsPanel};
