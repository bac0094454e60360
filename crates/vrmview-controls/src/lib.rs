//! vrmview controls
//!
//! Orbit camera math and the mapping from raw window input to viewer actions.

pub mod camera;
pub mod input;

pub use camera::{CameraConfig, OrbitCamera};
pub use input::{InputBinding, InputHandler, InputState, KeyBindings, ViewerAction};
