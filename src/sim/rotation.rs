//! Playfield rotation
//!
//! A turn goes Stable -> Pending -> InProgress -> Stable. A pending request
//! is picked up at the end of a tick; starting it freezes physics and
//! snapshots every ball velocity in world space. After the freeze hold the
//! container sweeps to its new angle, then the orientation is committed, the
//! geometry rebuilt and the snapshots restored. Ball paths therefore look
//! the same on screen before and after the turn.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};

use super::orientation::{PlayfieldTransform, quarter_turns};
use super::schedule::{Task, TaskKey};
use super::state::{GamePhase, GameState};
use crate::events::{Cue, GameEvent};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RotationState {
    #[default]
    Stable,
    Pending { angle: f32 },
    InProgress {
        angle: f32,
        /// Simulation time the sweep began; `None` during the freeze hold
        sweep_started: Option<f64>,
        /// World-space velocities keyed by ball id
        snapshots: BTreeMap<u32, Vec2>,
    },
}

impl RotationState {
    pub fn is_stable(&self) -> bool {
        matches!(self, RotationState::Stable)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, RotationState::InProgress { .. })
    }
}

/// Turn angles the timer picks from
pub const TIMED_ROTATION_ANGLES: [f32; 3] = [FRAC_PI_2, -FRAC_PI_2, PI];

pub fn banner_for(angle: f32) -> &'static str {
    match quarter_turns(angle) {
        2 => "180 Spin",
        1 => "Rotate +90",
        _ => "Rotate -90",
    }
}

/// Ask for a turn. Ignored unless the game is in active play with no other
/// turn queued or running.
pub fn request_rotation(state: &mut GameState, angle: f32) -> bool {
    if state.phase != GamePhase::Playing || !state.rotation.is_stable() {
        log::debug!("Rotation request ignored ({:?}, {:?})", state.phase, state.rotation);
        return false;
    }
    state.rotation = RotationState::Pending { angle };
    true
}

/// Pick a random turn once the rotation timer runs out
pub fn advance_rotation_timer(state: &mut GameState, dt: f32) {
    use rand::Rng;

    if state.phase != GamePhase::Playing || !state.rotation.is_stable() {
        return;
    }
    state.run.rotation_timer += dt;
    if state.run.rotation_timer >= state.run.rotation_interval {
        state.run.rotation_timer = 0.0;
        let index = state.rng.random_range(0..TIMED_ROTATION_ANGLES.len());
        request_rotation(state, TIMED_ROTATION_ANGLES[index]);
    }
}

/// Start a pending turn: freeze, snapshot, announce, schedule the sweep
pub fn begin_pending_rotation(state: &mut GameState) {
    let RotationState::Pending { angle } = state.rotation else {
        return;
    };
    if state.phase != GamePhase::Playing {
        state.rotation = RotationState::Stable;
        return;
    }

    let world = state.container_transform();
    let snapshots: BTreeMap<u32, Vec2> = state
        .balls
        .iter()
        .filter(|b| b.is_free())
        .map(|b| (b.id, world.to_world(b.vel)))
        .collect();

    state.physics_speed = 0.0;
    state.run.rotation_timer = 0.0;
    state.rotation = RotationState::InProgress {
        angle,
        sweep_started: None,
        snapshots,
    };

    let duration = state.config.message_duration;
    state.emit_message(banner_for(angle), duration);
    state.emit_cue(Cue::Rotation);
    state.emit(GameEvent::RotationStarted { angle });

    let due = state.time + state.config.rotation_freeze_duration as f64;
    state.scheduler.replace(TaskKey::Rotation, due, Task::RotationSweep { angle });
    log::info!("Rotation started: {} from {}", banner_for(angle), state.orientation.label());
}

/// Freeze hold over: start the visual sweep
pub fn start_sweep(state: &mut GameState, angle: f32) {
    if let RotationState::InProgress { sweep_started, .. } = &mut state.rotation {
        *sweep_started = Some(state.time);
    }
    let due = state.time + state.config.rotation_animation_duration as f64;
    state.scheduler.replace(TaskKey::Rotation, due, Task::RotationFinish { angle });
}

/// Commit the new orientation and resume play
pub fn finish_rotation(state: &mut GameState, angle: f32) {
    let RotationState::InProgress { snapshots, .. } = std::mem::take(&mut state.rotation) else {
        return;
    };

    state.orientation = state.orientation.after_turn(angle);
    state.drops.clear();
    state.rebuild_geometry();

    let frame = PlayfieldTransform::for_orientation(state.orientation);
    for ball in state.balls.iter_mut().filter(|b| b.is_free()) {
        if let Some(world) = snapshots.get(&ball.id) {
            ball.vel = frame.to_local(crate::rotate_vec(*world, angle));
        }
    }

    state.physics_speed = 1.0;
    state.run.multiplier = state.run.multiplier.saturating_sub(1).max(1);
    state.run.rotation_interval = (state.run.rotation_interval
        * state.config.rotation_interval_shrink)
        .max(state.config.rotation_interval_floor);

    let orientation = state.orientation;
    state.emit(GameEvent::RotationFinished { orientation });
    state.emit_hud();
    log::info!(
        "Rotation finished: paddle on the {} edge, next in {:.1}s",
        orientation.label(),
        state.run.rotation_interval
    );
}

/// Drop any queued or running turn without committing it
pub fn cancel_rotation(state: &mut GameState) {
    state.scheduler.cancel(TaskKey::Rotation);
    if state.rotation.is_in_progress() {
        state.physics_speed = 1.0;
    }
    state.rotation = RotationState::Stable;
}

/// Container rotation on screen, interpolated during a sweep
pub fn container_transform(state: &GameState) -> PlayfieldTransform {
    match &state.rotation {
        RotationState::InProgress {
            angle,
            sweep_started: Some(started),
            ..
        } => {
            let duration = state.config.rotation_animation_duration.max(1e-3) as f64;
            let progress = ((state.time - started) / duration).clamp(0.0, 1.0) as f32;
            PlayfieldTransform::sweeping(state.orientation, *angle, progress)
        }
        _ => PlayfieldTransform::for_orientation(state.orientation),
    }
}
