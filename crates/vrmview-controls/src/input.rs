//! Input system with action-based mapping
//!
//! Raw winit events update an [`InputState`]; the viewer asks it about
//! [`ViewerAction`]s. Edge detection compares the held set against the
//! snapshot taken at the end of the previous frame.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Viewer actions that can be triggered by input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewerAction {
    /// Orbit the camera while held (left mouse button by default)
    Orbit,
    /// Close the viewer (Escape by default)
    Quit,
    /// Re-frame the loaded model (R by default)
    ResetCamera,
    /// Show or hide the settings panel (G by default)
    ToggleGui,
    /// Show or hide the skybox (S by default)
    ToggleSkybox,
    /// Switch between toon and plain shading (T by default)
    ToggleToon,
    /// Raise skybox exposure (+/= by default)
    ExposureUp,
    /// Lower skybox exposure (- by default)
    ExposureDown,
    /// Soften the skybox horizon (] by default)
    LodUp,
    /// Sharpen the skybox horizon ([ by default)
    LodDown,
}

/// Current state of all inputs
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<ViewerAction>,
    /// Held set as of the last `end_frame`
    previous: HashSet<ViewerAction>,
    /// Pressed and released again within the current frame
    tapped: HashSet<ViewerAction>,
    cursor: Option<Vec2>,
    cursor_delta: Vec2,
    scroll_delta: f32,
}

impl InputState {
    /// Create a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, action: ViewerAction) -> bool {
        self.held.contains(&action)
    }

    /// True on the first frame an action is down.
    pub fn is_just_pressed(&self, action: ViewerAction) -> bool {
        (self.held.contains(&action) && !self.previous.contains(&action)) || self.tapped.contains(&action)
    }

    /// Pointer movement since the last frame, in physical pixels
    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    /// Scroll steps since the last frame; positive is away from the user
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    fn press(&mut self, action: ViewerAction) {
        self.held.insert(action);
    }

    fn release(&mut self, action: ViewerAction) {
        if self.held.remove(&action) && !self.previous.contains(&action) {
            self.tapped.insert(action);
        }
    }

    fn move_cursor(&mut self, position: Vec2) {
        if let Some(last) = self.cursor {
            self.cursor_delta += position - last;
        }
        self.cursor = Some(position);
    }

    /// Snapshot the held set and clear per-frame deltas (call at end of frame)
    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.held);
        self.tapped.clear();
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Drop everything held, e.g. when the window loses focus
    pub fn clear_all(&mut self) {
        self.held.clear();
        self.previous.clear();
        self.tapped.clear();
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}

/// Binding of a physical key to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputBinding {
    /// Keyboard key
    Key(KeyCode),
    /// Mouse button
    Mouse(u32), // 0 = left, 1 = right, 2 = middle
}

impl InputBinding {
    /// Short name for help text
    pub fn label(&self) -> String {
        match *self {
            Self::Mouse(0) => "Left mouse".into(),
            Self::Mouse(1) => "Right mouse".into(),
            Self::Mouse(2) => "Middle mouse".into(),
            Self::Mouse(id) => format!("Mouse {id}"),
            Self::Key(key) => key_label(key),
        }
    }
}

fn key_label(key: KeyCode) -> String {
    let label = match key {
        KeyCode::Escape => "Esc",
        KeyCode::Equal => "=",
        KeyCode::Minus => "-",
        KeyCode::NumpadAdd => "Num +",
        KeyCode::NumpadSubtract => "Num -",
        KeyCode::BracketLeft => "[",
        KeyCode::BracketRight => "]",
        _ => {
            let name = format!("{key:?}");
            return name
                .strip_prefix("Key")
                .or_else(|| name.strip_prefix("Digit"))
                .unwrap_or(&name)
                .to_string();
        }
    };
    label.to_string()
}

impl From<KeyCode> for InputBinding {
    fn from(key: KeyCode) -> Self {
        Self::Key(key)
    }
}

fn mouse_button_id(button: MouseButton) -> u32 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(id) => id as u32,
    }
}

/// Maps physical inputs to viewer actions
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<InputBinding, ViewerAction>,
    /// Reverse lookup: action to all bindings
    reverse: HashMap<ViewerAction, Vec<InputBinding>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
            reverse: HashMap::new(),
        };

        bindings.bind_mouse(0, ViewerAction::Orbit);

        bindings.bind(KeyCode::Escape, ViewerAction::Quit);
        bindings.bind(KeyCode::KeyR, ViewerAction::ResetCamera);
        bindings.bind(KeyCode::KeyG, ViewerAction::ToggleGui);
        bindings.bind(KeyCode::KeyS, ViewerAction::ToggleSkybox);
        bindings.bind(KeyCode::KeyT, ViewerAction::ToggleToon);

        bindings.bind(KeyCode::Equal, ViewerAction::ExposureUp);
        bindings.bind(KeyCode::NumpadAdd, ViewerAction::ExposureUp);
        bindings.bind(KeyCode::Minus, ViewerAction::ExposureDown);
        bindings.bind(KeyCode::NumpadSubtract, ViewerAction::ExposureDown);
        bindings.bind(KeyCode::BracketRight, ViewerAction::LodUp);
        bindings.bind(KeyCode::BracketLeft, ViewerAction::LodDown);

        bindings
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key to an action
    pub fn bind(&mut self, key: KeyCode, action: ViewerAction) {
        self.insert(InputBinding::Key(key), action);
    }

    /// Bind a mouse button to an action
    pub fn bind_mouse(&mut self, button: u32, action: ViewerAction) {
        self.insert(InputBinding::Mouse(button), action);
    }

    fn insert(&mut self, binding: InputBinding, action: ViewerAction) {
        if let Some(old) = self.bindings.insert(binding, action) {
            if let Some(list) = self.reverse.get_mut(&old) {
                list.retain(|b| *b != binding);
            }
        }
        self.reverse.entry(action).or_default().push(binding);
    }

    pub fn get_action(&self, binding: &InputBinding) -> Option<ViewerAction> {
        self.bindings.get(binding).copied()
    }

    pub fn get_key_action(&self, key: KeyCode) -> Option<ViewerAction> {
        self.get_action(&InputBinding::Key(key))
    }

    /// All inputs bound to an action, for help text
    pub fn bindings_for(&self, action: ViewerAction) -> &[InputBinding] {
        self.reverse.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Input handler that processes raw events and updates state
#[derive(Debug, Default)]
pub struct InputHandler {
    pub state: InputState,
    pub bindings: KeyBindings,
}

impl InputHandler {
    /// Create a new input handler with default bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a keyboard event
    pub fn handle_keyboard(&mut self, physical_key: PhysicalKey, element_state: ElementState) {
        if let PhysicalKey::Code(key_code) = physical_key {
            if let Some(action) = self.bindings.get_key_action(key_code) {
                self.apply(action, element_state);
            }
        }
    }

    /// Handle a mouse button event
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let binding = InputBinding::Mouse(mouse_button_id(button));
        if let Some(action) = self.bindings.get_action(&binding) {
            self.apply(action, state);
        }
    }

    fn apply(&mut self, action: ViewerAction, element_state: ElementState) {
        match element_state {
            ElementState::Pressed => self.state.press(action),
            ElementState::Released => self.state.release(action),
        }
    }

    /// Handle cursor movement, in physical pixels
    pub fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        self.state.move_cursor(Vec2::new(x as f32, y as f32));
    }

    /// Handle scroll wheel
    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let scroll = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
        };
        self.state.scroll_delta += scroll;
    }

    /// Clear frame-specific input data
    pub fn end_frame(&mut self) {
        self.state.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(handler: &mut InputHandler, code: KeyCode, state: ElementState) {
        handler.handle_keyboard(PhysicalKey::Code(code), state);
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.get_key_action(KeyCode::Escape), Some(ViewerAction::Quit));
        assert_eq!(bindings.get_key_action(KeyCode::KeyR), Some(ViewerAction::ResetCamera));
        assert_eq!(bindings.get_key_action(KeyCode::Equal), Some(ViewerAction::ExposureUp));
        assert_eq!(bindings.get_key_action(KeyCode::BracketLeft), Some(ViewerAction::LodDown));
        assert_eq!(bindings.bindings_for(ViewerAction::ExposureDown).len(), 2);
    }

    #[test]
    fn test_rebinding_moves_reverse_entry() {
        let mut bindings = KeyBindings::default();
        bindings.bind(KeyCode::KeyR, ViewerAction::ToggleToon);
        assert_eq!(bindings.get_key_action(KeyCode::KeyR), Some(ViewerAction::ToggleToon));
        assert!(bindings.bindings_for(ViewerAction::ResetCamera).is_empty());
        assert_eq!(bindings.bindings_for(ViewerAction::ToggleToon).len(), 2);
    }

    #[test]
    fn test_binding_labels() {
        let bindings = KeyBindings::default();
        let labels = |action| {
            bindings
                .bindings_for(action)
                .iter()
                .map(InputBinding::label)
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(ViewerAction::Orbit), ["Left mouse"]);
        assert_eq!(labels(ViewerAction::Quit), ["Esc"]);
        assert_eq!(labels(ViewerAction::ResetCamera), ["R"]);
        assert_eq!(labels(ViewerAction::ExposureUp), ["=", "Num +"]);
        assert_eq!(labels(ViewerAction::LodDown), ["["]);
        assert_eq!(InputBinding::Key(KeyCode::Digit3).label(), "3");
    }

    #[test]
    fn test_press_is_reported_once() {
        let mut handler = InputHandler::new();
        key(&mut handler, KeyCode::KeyG, ElementState::Pressed);
        assert!(handler.state.is_just_pressed(ViewerAction::ToggleGui));

        handler.end_frame();
        // key repeat while held
        key(&mut handler, KeyCode::KeyG, ElementState::Pressed);
        assert!(handler.state.is_held(ViewerAction::ToggleGui));
        assert!(!handler.state.is_just_pressed(ViewerAction::ToggleGui));

        key(&mut handler, KeyCode::KeyG, ElementState::Released);
        assert!(!handler.state.is_held(ViewerAction::ToggleGui));
        assert!(!handler.state.is_just_pressed(ViewerAction::ToggleGui));
    }

    #[test]
    fn test_tap_within_one_frame_is_not_lost() {
        let mut handler = InputHandler::new();
        key(&mut handler, KeyCode::KeyS, ElementState::Pressed);
        key(&mut handler, KeyCode::KeyS, ElementState::Released);
        assert!(!handler.state.is_held(ViewerAction::ToggleSkybox));
        assert!(handler.state.is_just_pressed(ViewerAction::ToggleSkybox));
        handler.end_frame();
        assert!(!handler.state.is_just_pressed(ViewerAction::ToggleSkybox));
    }

    #[test]
    fn test_cursor_delta_accumulates_per_frame() {
        let mut handler = InputHandler::new();
        handler.handle_cursor_moved(10.0, 10.0);
        assert_eq!(handler.state.cursor_delta(), Vec2::ZERO);
        handler.handle_cursor_moved(15.0, 8.0);
        handler.handle_cursor_moved(20.0, 6.0);
        assert_eq!(handler.state.cursor_delta(), Vec2::new(10.0, -4.0));
        handler.end_frame();
        assert_eq!(handler.state.cursor_delta(), Vec2::ZERO);
        handler.handle_cursor_moved(21.0, 6.0);
        assert_eq!(handler.state.cursor_delta(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_scroll_pixel_delta_is_scaled() {
        let mut handler = InputHandler::new();
        handler.handle_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        handler.handle_scroll(MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 240.0)));
        assert_eq!(handler.state.scroll_delta(), 3.0);
    }

    #[test]
    fn test_mouse_button_orbit() {
        let mut handler = InputHandler::new();
        handler.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(handler.state.is_held(ViewerAction::Orbit));
        handler.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        handler.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!handler.state.is_held(ViewerAction::Orbit));
    }
}
