//! Camera system module
//!
//! Orbit camera circling a target point, driven by pointer drag and scroll.

mod config;
mod controller;

pub use config::CameraConfig;
pub use controller::OrbitCamera;
