//! Game tuning
//!
//! Every balance knob the simulation reads. `GameConfig::default()` is the
//! shipped tuning; JSON overrides merge onto it field by field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable constants for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Distance from the playfield bottom to the paddle lane
    pub paddle_lane_inset: f32,
    /// Distance kept between the lane ends and the side walls
    pub paddle_edge_inset: f32,
    /// Fraction of the remaining distance covered per reference frame
    pub paddle_responsiveness: f32,
    pub paddle_snap_distance: f32,
    pub paddle_grow_multiplier: f32,
    pub paddle_shrink_multiplier: f32,
    pub paddle_effect_duration: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_initial_speed: f32,
    pub ball_maximum_speed: f32,
    /// Speed floor as a fraction of the launch speed
    pub ball_min_speed_factor: f32,
    /// Launch arc, radians measured from local +X
    pub launch_angle_min: f32,
    pub launch_angle_max: f32,
    /// Component ratio below which a ball counts as axis-aligned
    pub dislodge_epsilon: f32,
    pub dislodge_jitter_min: f32,
    pub dislodge_jitter_max: f32,
    /// How far past the lane edge a ball may travel before it is lost
    pub exit_tolerance: f32,
    /// Angle between neighbouring multiball spawns
    pub multiball_spread: f32,

    // === Bricks & layout ===
    pub brick_rows: usize,
    pub brick_columns: usize,
    pub brick_spacing: f32,
    pub brick_height: f32,
    pub playfield_inset: f32,
    pub brick_top_margin: f32,
    pub brick_bottom_margin: f32,
    pub brick_cell_height_min: f32,
    pub brick_cell_height_max: f32,
    pub boundary_corner_radius: f32,
    pub level_seed_base: u64,

    // === Crown input ===
    pub crown_noise_threshold: f64,
    pub crown_raw_delta_clamp: f64,
    pub crown_directional_grace: f64,
    pub crown_delta_filter_factor: f64,
    pub crown_position_gain: f64,
    pub crown_position_smoothing: f64,
    pub crown_smoothing_reference_fps: f64,
    pub crown_min_update_interval: f64,
    pub crown_max_update_interval: f64,

    // === Rotation ===
    pub rotation_freeze_duration: f32,
    pub rotation_animation_duration: f32,
    pub rotation_base_interval: f32,
    pub rotation_interval_shrink: f32,
    pub rotation_interval_floor: f32,
    pub level_clear_interval_shrink: f32,
    pub level_clear_interval_floor: f32,

    // === Lifecycle ===
    pub ball_launch_delay: f32,
    pub ball_respawn_delay_after_miss: f32,
    pub countdown_step_duration: f32,
    pub message_duration: f32,
    pub level_transition_phase_duration: f32,
    pub level_speed_growth: f32,
    pub lives_per_run: u32,
    pub max_lives: u32,

    // === Scoring ===
    pub score_standard_brick: u64,
    pub score_tough_brick: u64,
    pub score_explosive_brick: u64,
    pub score_chain_bonus: u64,
    pub explosion_chain_radius: f32,
    pub max_multiplier: u32,
    pub hits_per_multiplier: u32,

    // === Drops & power-ups ===
    pub drop_fall_speed: f32,
    pub drop_size: f32,
    /// Shrinks the paddle's catch rectangle on every side
    pub drop_catch_inset: f32,
    pub gun_effect_duration: f32,
    pub gun_fire_interval: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            paddle_width: 70.0,
            paddle_height: 12.0,
            paddle_lane_inset: 30.0,
            paddle_edge_inset: 8.0,
            paddle_responsiveness: 0.32,
            paddle_snap_distance: 2.0,
            paddle_grow_multiplier: 2.0,
            paddle_shrink_multiplier: 0.5,
            paddle_effect_duration: 8.0,

            ball_radius: 6.0,
            ball_initial_speed: 220.0,
            ball_maximum_speed: 520.0,
            ball_min_speed_factor: 0.75,
            launch_angle_min: PI / 4.0,
            launch_angle_max: PI * 3.0 / 4.0,
            dislodge_epsilon: 0.05,
            dislodge_jitter_min: 0.08,
            dislodge_jitter_max: 0.22,
            exit_tolerance: 48.0,
            multiball_spread: 0.35,

            brick_rows: 3,
            brick_columns: 6,
            brick_spacing: 6.0,
            brick_height: 18.0,
            playfield_inset: 6.0,
            brick_top_margin: 40.0,
            brick_bottom_margin: 64.0,
            brick_cell_height_min: 18.0,
            brick_cell_height_max: 24.0,
            boundary_corner_radius: 32.0,
            level_seed_base: 0xBA11_C0DE,

            crown_noise_threshold: 0.0012,
            crown_raw_delta_clamp: 0.35,
            crown_directional_grace: 0.004,
            crown_delta_filter_factor: 0.18,
            crown_position_gain: 0.42,
            crown_position_smoothing: 0.16,
            crown_smoothing_reference_fps: 120.0,
            crown_min_update_interval: 1.0 / 200.0,
            crown_max_update_interval: 1.0 / 25.0,

            rotation_freeze_duration: 0.35,
            rotation_animation_duration: 0.4,
            rotation_base_interval: 16.0,
            rotation_interval_shrink: 0.93,
            rotation_interval_floor: 7.0,
            level_clear_interval_shrink: 0.9,
            level_clear_interval_floor: 6.0,

            ball_launch_delay: 0.45,
            ball_respawn_delay_after_miss: 0.9,
            countdown_step_duration: 0.6,
            message_duration: 1.2,
            level_transition_phase_duration: 1.2,
            level_speed_growth: 1.12,
            lives_per_run: 3,
            max_lives: 6,

            score_standard_brick: 100,
            score_tough_brick: 200,
            score_explosive_brick: 150,
            score_chain_bonus: 75,
            explosion_chain_radius: 60.0,
            max_multiplier: 10,
            hits_per_multiplier: 6,

            drop_fall_speed: 95.0,
            drop_size: 16.0,
            drop_catch_inset: 2.0,
            gun_effect_duration: 5.0,
            gun_fire_interval: 0.25,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON override and validate the result
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("ball_radius", self.ball_radius),
            ("ball_initial_speed", self.ball_initial_speed),
            ("ball_maximum_speed", self.ball_maximum_speed),
            ("brick_height", self.brick_height),
            ("rotation_animation_duration", self.rotation_animation_duration),
            ("rotation_base_interval", self.rotation_base_interval),
            ("rotation_interval_floor", self.rotation_interval_floor),
            ("countdown_step_duration", self.countdown_step_duration),
            ("ball_respawn_delay_after_miss", self.ball_respawn_delay_after_miss),
            ("level_transition_phase_duration", self.level_transition_phase_duration),
            ("drop_fall_speed", self.drop_fall_speed),
            ("gun_fire_interval", self.gun_fire_interval),
            ("level_speed_growth", self.level_speed_growth),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }

        let unit_open = [
            ("paddle_responsiveness", self.paddle_responsiveness as f64),
            ("crown_delta_filter_factor", self.crown_delta_filter_factor),
            ("crown_position_smoothing", self.crown_position_smoothing),
        ];
        for (field, value) in unit_open {
            if !(value > 0.0 && value < 1.0) {
                return Err(invalid(field, format!("must be in (0, 1), got {value}")));
            }
        }

        if self.ball_maximum_speed < self.ball_initial_speed {
            return Err(invalid(
                "ball_maximum_speed",
                "must not be below ball_initial_speed".to_string(),
            ));
        }
        if self.brick_cell_height_min > self.brick_cell_height_max {
            return Err(invalid(
                "brick_cell_height_min",
                "must not exceed brick_cell_height_max".to_string(),
            ));
        }
        if self.crown_min_update_interval > self.crown_max_update_interval {
            return Err(invalid(
                "crown_min_update_interval",
                "must not exceed crown_max_update_interval".to_string(),
            ));
        }
        if self.dislodge_jitter_min > self.dislodge_jitter_max {
            return Err(invalid(
                "dislodge_jitter_min",
                "must not exceed dislodge_jitter_max".to_string(),
            ));
        }
        if self.launch_angle_min > self.launch_angle_max {
            return Err(invalid(
                "launch_angle_min",
                "must not exceed launch_angle_max".to_string(),
            ));
        }
        if self.brick_rows == 0 || self.brick_columns == 0 {
            return Err(invalid("brick_rows", "grid must not be empty".to_string()));
        }
        if self.max_multiplier == 0 || self.hits_per_multiplier == 0 {
            return Err(invalid("max_multiplier", "must be at least 1".to_string()));
        }
        if self.lives_per_run == 0 || self.lives_per_run > self.max_lives {
            return Err(invalid(
                "lives_per_run",
                format!("must be in 1..={}", self.max_lives),
            ));
        }
        Ok(())
    }

    pub fn base_half_paddle_width(&self) -> f32 {
        self.paddle_width / 2.0
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
