//! vrmview Core - shared types for the vrmview model viewer
//!
//! This crate provides the small set of types every other crate agrees on:
//! - Mathematical primitives (re-exported from glam)
//! - Axis-aligned bounds used to frame a loaded model
//! - Frame timing for the render loop

pub mod bounds;
pub mod time;

pub use bounds::{Bounds, MIN_RADIUS, RADIUS_EPSILON};
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
pub use time::{FrameTimer, TimerConfig};
