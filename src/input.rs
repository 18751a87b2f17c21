//! Rotary (crown) input smoothing
//!
//! Turns a noisy, relative rotary value into a damped paddle position in
//! [0, 1]. The filters are frame-rate normalized, so the same hand motion
//! gives the same paddle travel at 30 Hz or 120 Hz.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Filter constants pulled from `GameConfig`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrownTuning {
    pub noise_threshold: f64,
    pub raw_delta_clamp: f64,
    pub directional_grace: f64,
    pub delta_filter_factor: f64,
    pub position_gain: f64,
    pub position_smoothing: f64,
    pub reference_fps: f64,
    pub min_update_interval: f64,
    pub max_update_interval: f64,
}

impl From<&GameConfig> for CrownTuning {
    fn from(config: &GameConfig) -> Self {
        Self {
            noise_threshold: config.crown_noise_threshold,
            raw_delta_clamp: config.crown_raw_delta_clamp,
            directional_grace: config.crown_directional_grace,
            delta_filter_factor: config.crown_delta_filter_factor,
            position_gain: config.crown_position_gain,
            position_smoothing: config.crown_position_smoothing,
            reference_fps: config.crown_smoothing_reference_fps,
            min_update_interval: config.crown_min_update_interval,
            max_update_interval: config.crown_max_update_interval,
        }
    }
}

/// Visible position snaps to the target inside this distance
const SNAP_EPSILON: f64 = 0.0001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrownInput {
    tuning: CrownTuning,
    position: f64,
    target: f64,
    filtered_delta: f64,
    last_value: f64,
    last_timestamp: Option<f64>,
    last_direction: f64,
    /// Raw delta that survived clamping, reversal suppression and the dead zone
    last_applied_delta: f64,
}

impl CrownInput {
    pub fn new(tuning: CrownTuning, initial_position: f64, initial_value: f64) -> Self {
        let clamped = initial_position.clamp(0.0, 1.0);
        Self {
            tuning,
            position: clamped,
            target: clamped,
            filtered_delta: 0.0,
            last_value: initial_value,
            last_timestamp: None,
            last_direction: 0.0,
            last_applied_delta: 0.0,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(CrownTuning::from(config), 0.5, 0.0)
    }

    /// Smoothed position in [0, 1]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Position the smoothed value is chasing
    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn last_applied_delta(&self) -> f64 {
        self.last_applied_delta
    }

    /// Feed one raw sample; returns the new smoothed position
    pub fn process(&mut self, value: f64, timestamp: f64) -> f64 {
        let dt = self.resolve_delta_time(timestamp);
        let t = self.tuning;

        let mut delta = value - self.last_value;
        self.last_value = value;
        delta = delta.clamp(-t.raw_delta_clamp, t.raw_delta_clamp);

        let direction = sign(delta);
        if direction != 0.0
            && self.last_direction != 0.0
            && direction != self.last_direction
            && delta.abs() < t.directional_grace
        {
            delta = 0.0;
        } else if direction != 0.0 {
            self.last_direction = direction;
        }

        if delta.abs() < t.noise_threshold {
            delta = 0.0;
        }
        self.last_applied_delta = delta;

        let delta_response = smoothing_response(dt, t.delta_filter_factor, t.reference_fps);
        self.filtered_delta += (delta - self.filtered_delta) * delta_response;

        self.target = (self.target + self.filtered_delta * t.position_gain).clamp(0.0, 1.0);

        let position_response = smoothing_response(dt, t.position_smoothing, t.reference_fps);
        self.position += (self.target - self.position) * position_response;
        self.position = self.position.clamp(0.0, 1.0);

        if (self.position - self.target).abs() < SNAP_EPSILON {
            self.position = self.target;
        }

        self.position
    }

    /// Reinitialize every filter stage at `position`
    pub fn reset(&mut self, position: f64, value: f64, timestamp: Option<f64>) {
        let clamped = position.clamp(0.0, 1.0);
        self.position = clamped;
        self.target = clamped;
        self.filtered_delta = 0.0;
        self.last_direction = 0.0;
        self.last_applied_delta = 0.0;
        self.last_value = value;
        self.last_timestamp = timestamp;
    }

    /// Jump to `position` (e.g. after a touch), keeping the last raw value
    /// unless a new one is given
    pub fn override_position(&mut self, position: f64, value: Option<f64>, timestamp: Option<f64>) {
        let value = value.unwrap_or(self.last_value);
        self.reset(position, value, timestamp);
    }

    fn resolve_delta_time(&mut self, timestamp: f64) -> f64 {
        let t = self.tuning;
        let dt = match self.last_timestamp {
            Some(previous) => {
                (timestamp - previous).clamp(t.min_update_interval, t.max_update_interval)
            }
            None => t.min_update_interval,
        };
        self.last_timestamp = Some(timestamp);
        dt
    }
}

/// 1 - (1 - base)^(dt * fps): per-sample blend that matches `base` per reference frame
fn smoothing_response(dt: f64, base: f64, reference_fps: f64) -> f64 {
    if base <= 0.0 {
        return 1.0;
    }
    1.0 - (1.0 - base).powf(dt * reference_fps)
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
