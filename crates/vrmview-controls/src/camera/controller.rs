//! Orbit camera with pointer drag and scroll zoom

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;

use crate::input::{InputState, ViewerAction};

use super::CameraConfig;

/// Camera orbiting a target point at a given distance.
///
/// Angles are kept in degrees. Azimuth 0 looks down -Z from +Z; elevation is
/// always within the configured pitch limits.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub config: CameraConfig,
    target: Vec3,
    distance: f32,
    azimuth: f32,
    elevation: f32,
    dragging: bool,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::with_config(CameraConfig::default())
    }

    pub fn with_config(config: CameraConfig) -> Self {
        let mut camera = Self {
            config,
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.0,
            dragging: false,
        };
        camera.reset(Vec3::ZERO, 1.0);
        camera
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Frame a model with the given bounding sphere.
    pub fn reset(&mut self, center: Vec3, radius: f32) {
        self.target = center;
        self.distance = (radius * self.config.framing_scale).max(self.config.min_distance);
        self.azimuth = self.config.default_azimuth;
        self.elevation = self.clamp_elevation(self.config.default_elevation);
        debug!("Camera framed at {:?}, distance {:.3}", self.target, self.distance);
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Rotate by a pointer movement in pixels. Ignored unless a drag is active.
    pub fn handle_drag(&mut self, delta: Vec2) {
        if !self.dragging {
            return;
        }
        self.azimuth -= delta.x * self.config.drag_sensitivity;
        self.elevation = self.clamp_elevation(self.elevation + delta.y * self.config.drag_sensitivity);
    }

    /// Zoom proportionally to the current distance.
    pub fn handle_zoom(&mut self, scroll: f32) {
        self.distance -= scroll * self.distance * self.config.zoom_sensitivity;
        self.distance = self.distance.max(self.config.min_distance);
    }

    /// Apply one frame of input. Presses that land on the GUI never start a drag
    /// and scrolling over it does not zoom.
    pub fn update(&mut self, input: &InputState, pointer_over_ui: bool) {
        if input.is_just_pressed(ViewerAction::Orbit) && !pointer_over_ui {
            self.begin_drag();
        }
        if !input.is_held(ViewerAction::Orbit) {
            self.end_drag();
        }
        self.handle_drag(input.cursor_delta());

        if input.scroll_delta() != 0.0 && !pointer_over_ui {
            self.handle_zoom(input.scroll_delta());
        }
    }

    fn clamp_elevation(&self, elevation: f32) -> f32 {
        elevation.clamp(self.config.pitch_min, self.config.pitch_max)
    }

    pub fn eye_position(&self) -> Vec3 {
        let azimuth = self.azimuth.to_radians();
        let elevation = self.elevation.to_radians();
        let offset = Vec3::new(
            elevation.cos() * azimuth.sin(),
            elevation.sin(),
            elevation.cos() * azimuth.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Right-handed perspective with a [0, 1] depth range.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov.to_radians(),
            aspect_ratio.max(f32::EPSILON),
            self.config.near,
            self.config.far,
        )
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputHandler;
    use winit::event::{ElementState, MouseButton};

    #[test]
    fn test_reset_frames_model() {
        let mut camera = OrbitCamera::new();
        camera.reset(Vec3::new(1.0, 2.0, 3.0), 4.0);
        assert_eq!(camera.target(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.distance(), 10.0);
        assert_eq!(camera.azimuth(), 45.0);
        assert_eq!(camera.elevation(), 15.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut camera = OrbitCamera::new();
        camera.begin_drag();
        camera.handle_drag(Vec2::new(40.0, -12.0));
        camera.handle_zoom(3.0);

        camera.reset(Vec3::ONE, 2.0);
        let first = (camera.target(), camera.distance(), camera.azimuth(), camera.elevation());
        camera.reset(Vec3::ONE, 2.0);
        let second = (camera.target(), camera.distance(), camera.azimuth(), camera.elevation());
        assert_eq!(first, second);
    }

    #[test]
    fn test_elevation_clamped_under_any_drag() {
        let mut camera = OrbitCamera::new();
        camera.begin_drag();
        for _ in 0..50 {
            camera.handle_drag(Vec2::new(0.0, 1000.0));
            assert!(camera.elevation() <= 89.0);
        }
        assert_eq!(camera.elevation(), 89.0);
        for _ in 0..50 {
            camera.handle_drag(Vec2::new(0.0, -1000.0));
            assert!(camera.elevation() >= -89.0);
        }
        assert_eq!(camera.elevation(), -89.0);
    }

    #[test]
    fn test_drag_direction() {
        let mut camera = OrbitCamera::new();
        let (azimuth, elevation) = (camera.azimuth(), camera.elevation());
        camera.handle_drag(Vec2::new(10.0, 10.0));
        assert_eq!(camera.azimuth(), azimuth, "no drag active");

        camera.begin_drag();
        camera.handle_drag(Vec2::new(10.0, 4.0));
        assert_eq!(camera.azimuth(), azimuth - 2.5);
        assert_eq!(camera.elevation(), elevation + 1.0);
    }

    #[test]
    fn test_zoom_is_proportional_and_floored() {
        let mut camera = OrbitCamera::new();
        camera.reset(Vec3::ZERO, 4.0);
        camera.handle_zoom(1.0);
        assert!((camera.distance() - 9.0).abs() < 1e-5);
        camera.handle_zoom(-1.0);
        assert!((camera.distance() - 9.9).abs() < 1e-5);

        for _ in 0..500 {
            camera.handle_zoom(5.0);
        }
        assert_eq!(camera.distance(), camera.config.min_distance);
    }

    #[test]
    fn test_eye_position_offset() {
        let mut camera = OrbitCamera::new();
        camera.reset(Vec3::new(0.0, 1.0, 0.0), 2.0);
        let eye = camera.eye_position();
        assert!(((eye - camera.target()).length() - 5.0).abs() < 1e-5);

        // azimuth 0, elevation 0 puts the eye on +Z
        camera.config.default_azimuth = 0.0;
        camera.config.default_elevation = 0.0;
        camera.reset(Vec3::ZERO, 2.0);
        assert!((camera.eye_position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_view_looks_at_target() {
        let mut camera = OrbitCamera::new();
        camera.reset(Vec3::new(3.0, -1.0, 2.0), 1.5);
        let in_view = camera.view_matrix().transform_point3(camera.target());
        assert!(in_view.x.abs() < 1e-4 && in_view.y.abs() < 1e-4);
        assert!((in_view.z + camera.distance()).abs() < 1e-4);
    }

    #[test]
    fn test_update_ignores_presses_over_ui() {
        let mut camera = OrbitCamera::new();
        let mut input = InputHandler::new();
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.update(&input.state, true);
        assert!(!camera.is_dragging());

        input.end_frame();
        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.update(&input.state, false);
        // re-press in the same frame reads as still held, not a new press
        assert!(!camera.is_dragging());

        input.end_frame();
        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        camera.update(&input.state, false);
        input.end_frame();
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        camera.update(&input.state, false);
        assert!(camera.is_dragging());
    }
}
