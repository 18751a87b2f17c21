//! Run lifecycle: new game, countdown, serve, life loss, level transitions
//! and game over
//!
//! Every transition here is either called from `tick` after the collision
//! handlers ran, or from a scheduled task. `start_new_game` is the one entry
//! point the host may call directly.

use glam::Vec2;

use super::orientation::Orientation;
use super::rotation::{self, RotationState};
use super::schedule::{Task, TaskKey};
use super::state::{ActiveEffects, Brick, GamePhase, GameState, RunState};
use crate::events::{Cue, GameEvent};

pub const COUNTDOWN_MESSAGES: [&str; 5] = ["Get READY", "3", "2", "1", "Go!"];

/// Upper bound on scheduled tasks run in a single tick
const MAX_TASKS_PER_TICK: usize = 32;

/// Reset the run and start the first level's countdown. Safe to call at
/// any time, including mid-countdown: pending tasks from the previous run
/// are cancelled first.
pub fn start_new_game(state: &mut GameState) {
    state.scheduler.cancel_all();
    state.rotation = RotationState::Stable;

    state.run = RunState::new(&state.config);
    state.orientation = Orientation::Bottom;
    state.rebuild_geometry();
    state.paused = false;
    state.physics_speed = 1.0;
    state.effects = ActiveEffects::default();
    state.paddle.set_width_multiplier(1.0);
    state.paddle.position = 0.5;
    state.paddle.set_target(0.5);
    state.crown.override_position(0.5, None, None);
    state.balls.clear();
    state.drops.clear();
    state.bricks.clear();
    state.levels.reset();

    state.emit(GameEvent::GameStarted { score: 0 });
    state.emit(GameEvent::ScoreChanged { score: 0 });
    state.gameplay_visible = true;
    state.emit(GameEvent::GameplayVisible(true));

    load_next_level(state);
    state.emit_hud();
    state.spawn_anchored_ball();
    start_countdown(state);

    log::info!("New game started (seed {})", state.seed);
}

/// Replace the bricks with the next layout from the generator
pub fn load_next_level(state: &mut GameState) {
    let base = state.geometry.portrait_bounds(&state.config);
    let layout = state.levels.next_layout(&state.config, base.size());
    let bounds = state.geometry.bounds;

    let mut bricks = Vec::with_capacity(layout.bricks.len());
    for descriptor in &layout.bricks {
        let id = state.next_entity_id();
        bricks.push(Brick::from_descriptor(id, &layout, descriptor, &bounds));
    }
    state.bricks = bricks;
    state.run.level = layout.level_number;

    let level = layout.level_number;
    let duration = state.config.level_transition_phase_duration;
    state.emit(GameEvent::LevelStarted { level });
    state.emit_message(format!("Level {level}"), duration);
    log::info!("Level {level} loaded: {} bricks (seed {:#x})", state.bricks.len(), layout.seed);
}

/// Ball anchored, physics frozen until the countdown launches it
pub fn start_countdown(state: &mut GameState) {
    state.phase = GamePhase::Countdown;
    state.physics_speed = 1.0;
    state.scheduler.cancel(TaskKey::Serve);
    state
        .scheduler
        .replace(TaskKey::Countdown, state.time, Task::CountdownStep { step: 0 });
}

fn run_countdown_step(state: &mut GameState, step: usize) {
    if state.phase != GamePhase::Countdown {
        return;
    }
    let Some(text) = COUNTDOWN_MESSAGES.get(step) else {
        return;
    };
    let step_duration = state.config.countdown_step_duration;
    state.emit_message(*text, step_duration);

    if step + 1 < COUNTDOWN_MESSAGES.len() {
        let due = state.time + step_duration as f64;
        state
            .scheduler
            .schedule(TaskKey::Countdown, due, Task::CountdownStep { step: step + 1 });
    } else {
        let due = state.time + state.config.ball_launch_delay as f64;
        state.scheduler.replace(TaskKey::Serve, due, Task::Launch);
    }
}

/// Release anchored balls at a random angle inside the launch arc
pub fn launch_anchored_balls(state: &mut GameState) {
    use rand::Rng;

    if state.phase != GamePhase::Countdown {
        return;
    }
    let speed = state.run.launch_speed(&state.config);
    let (min, max) = (state.config.launch_angle_min, state.config.launch_angle_max);

    let mut launched = Vec::new();
    for ball in state.balls.iter_mut().filter(|b| !b.is_free()) {
        let angle = state.rng.random_range(min..=max);
        ball.launch(angle, speed);
        launched.push((ball.id, ball.vel));
    }
    for (ball_id, vel) in launched {
        state.emit(GameEvent::BallLaunched { ball_id, vel });
    }

    state.phase = GamePhase::Playing;
    state.physics_speed = 1.0;
    log::debug!("Serve at t={:.2}s", state.time);
}

/// Every ball is gone: take a life, then respawn or end the run
pub fn lose_life(state: &mut GameState) {
    rotation::cancel_rotation(state);
    state.run.lives = state.run.lives.saturating_sub(1);
    state.run.reset_combo();
    state.balls.clear();
    state.drops.clear();
    state.effects = ActiveEffects::default();
    state.paddle.set_width_multiplier(1.0);

    state.emit_cue(Cue::LifeLost);
    state.emit_hud();
    log::info!("Life lost, {} remaining", state.run.lives);

    if state.run.lives == 0 {
        game_over(state);
        return;
    }

    let delay = state.config.ball_respawn_delay_after_miss;
    state.emit_message("Miss", delay);
    state.spawn_anchored_ball();
    state.phase = GamePhase::Countdown;
    state.scheduler.cancel(TaskKey::Countdown);
    state
        .scheduler
        .replace(TaskKey::Serve, state.time + delay as f64, Task::Launch);
}

/// Last breakable brick is gone: hide gameplay, speed up, load the next level
pub fn begin_level_transition(state: &mut GameState) {
    rotation::cancel_rotation(state);
    state.scheduler.cancel(TaskKey::Serve);
    state.scheduler.cancel(TaskKey::Countdown);

    state.phase = GamePhase::LevelTransition;
    state.physics_speed = 0.0;
    state.balls.clear();
    state.drops.clear();
    state.effects = ActiveEffects::default();
    state.paddle.set_width_multiplier(1.0);

    let config = &state.config;
    state.run.speed_multiplier *= config.level_speed_growth;
    state.run.rotation_interval = (state.run.rotation_interval * config.level_clear_interval_shrink)
        .max(config.level_clear_interval_floor);
    state.run.rotation_timer = 0.0;

    let duration = config.level_transition_phase_duration;
    state.gameplay_visible = false;
    state.emit(GameEvent::GameplayVisible(false));
    state.emit_cue(Cue::LevelClear);
    state.emit_message("Level Complete", duration);
    state
        .scheduler
        .replace(TaskKey::Transition, state.time + duration as f64, Task::TransitionLoadLevel);

    log::info!(
        "Level {} cleared, speed x{:.2}",
        state.run.level,
        state.run.speed_multiplier
    );
}

fn transition_load_level(state: &mut GameState) {
    if state.phase != GamePhase::LevelTransition {
        return;
    }
    load_next_level(state);
    state.emit_hud();
    let due = state.time + state.config.level_transition_phase_duration as f64;
    state
        .scheduler
        .replace(TaskKey::Transition, due, Task::TransitionCountdown);
}

fn transition_countdown(state: &mut GameState) {
    if state.phase != GamePhase::LevelTransition {
        return;
    }
    state.gameplay_visible = true;
    state.emit(GameEvent::GameplayVisible(true));
    state.spawn_anchored_ball();
    start_countdown(state);
}

pub fn game_over(state: &mut GameState) {
    state.scheduler.cancel_all();
    state.rotation = RotationState::Stable;
    state.phase = GamePhase::GameOver;
    state.physics_speed = 0.0;
    state.drops.clear();
    for ball in &mut state.balls {
        ball.vel = Vec2::ZERO;
    }

    let final_score = state.run.score;
    state.gameplay_visible = false;
    state.emit(GameEvent::GameplayVisible(false));
    state.emit_message("Game Over", state.config.message_duration);
    state.emit(GameEvent::GameEnded { final_score });
    log::info!("Game over: score {final_score}, level {}", state.run.level);
}

/// Run every task that has come due, earliest first
pub fn run_due_tasks(state: &mut GameState) {
    for _ in 0..MAX_TASKS_PER_TICK {
        let Some(scheduled) = state.scheduler.pop_due(state.time) else {
            return;
        };
        match scheduled.task {
            Task::CountdownStep { step } => run_countdown_step(state, step),
            Task::Launch => launch_anchored_balls(state),
            Task::RotationSweep { angle } => rotation::start_sweep(state, angle),
            Task::RotationFinish { angle } => rotation::finish_rotation(state, angle),
            Task::TransitionLoadLevel => transition_load_level(state),
            Task::TransitionCountdown => transition_countdown(state),
        }
    }
    log::warn!("Task budget exhausted at t={:.3}s", state.time);
}

/// End-of-tick transitions, evaluated after collision handlers
///
/// `balls_exited` is how many balls left through the lane this tick.
pub fn evaluate(state: &mut GameState, dt: f32, balls_exited: usize) {
    if state.phase == GamePhase::Playing {
        if !state.geometry.bounds.is_degenerate() && !state.has_breakable_bricks() {
            begin_level_transition(state);
        } else if !state.balls.iter().any(|b| b.is_free()) {
            if balls_exited == 0 {
                log::warn!("No ball in play without an exit; counting it as a miss");
            }
            lose_life(state);
        }
    }

    rotation::advance_rotation_timer(state, dt);
    rotation::begin_pending_rotation(state);
    run_due_tasks(state);
}
