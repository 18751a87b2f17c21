//! Rotabrix - A brick breaker whose playfield keeps turning
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, rotation, lifecycle)
//! - `input`: Rotary input smoothing
//! - `config`: Data-driven game tuning
//! - `random`: Seeded splitmix64 RNG
//! - `events`: Event sink consumed by presentation/audio layers

pub mod config;
pub mod events;
pub mod input;
pub mod random;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use events::{Cue, EventSink, GameEvent, HudSnapshot};
pub use input::CrownInput;
pub use random::SeededRandom;

use glam::Vec2;

/// Simulation constants that are not meant to be tuned
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the fixed-step driver will try to catch up on
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Frame rate the paddle responsiveness constant was tuned at
    pub const PADDLE_REFERENCE_FPS: f32 = 60.0;
    /// Upper bound on the paddle lerp exponent (avoids overshooting on long frames)
    pub const PADDLE_MAX_STEP: f32 = 1.5;

    /// Ticks a ball ignores the paddle after bouncing off it
    pub const PADDLE_COOLDOWN_TICKS: u32 = 6;
    /// Segments used to approximate each rounded boundary corner
    pub const CORNER_SEGMENTS: usize = 6;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Unit vector pointing along `angle`
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Smoothstep-style ease used for the playfield sweep
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
