//! Frame timing for the render loop
//!
//! Tracks per-frame delta time and a smoothed frames-per-second estimate for
//! the settings panel.

use serde::{Deserialize, Serialize};

/// Configuration for the frame timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Maximum delta time to prevent large jumps after a stall (seconds)
    pub max_delta_time: f32,
    /// Weight of the newest sample in the FPS moving average (0-1)
    pub fps_smoothing: f32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_delta_time: 0.25,
            fps_smoothing: 0.1,
        }
    }
}

/// Per-frame timing state
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    /// Configuration
    pub config: TimerConfig,
    /// Delta time for this frame (clamped)
    pub delta_time: f32,
    /// Smoothed frames per second
    fps: f32,
}

impl FrameTimer {
    /// Create a new frame timer with custom config
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance the timer with the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        self.delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);

        if self.delta_time > 0.0 {
            let sample = 1.0 / self.delta_time;
            self.fps = if self.fps == 0.0 {
                sample
            } else {
                self.fps + (sample - self.fps) * self.config.fps_smoothing
            };
        }
    }

    /// Smoothed frames per second (0 before the first non-zero delta)
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
