//! Fixed timestep simulation tick
//!
//! One tick runs, in order: input, paddle motion, ball physics, collision
//! handlers (scoring, drops, multiplier), drop/gun/effect updates, speed
//! stabilization and exit detection, and finally lifecycle transitions and
//! due tasks. Handlers always see the contacts of the whole physics step
//! before any life-loss or level-clear decision is made.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use super::collision::{ball_polyline_collision, ball_rect_collision, bounce, raycast_up};
use super::lifecycle;
use super::rotation;
use super::state::{Ball, BrickKind, DropKind, FallingDrop, GamePhase, GameState};
use crate::consts::*;
use crate::events::{Cue, GameEvent};

/// Raw rotary sample as delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrownSample {
    pub value: f64,
    /// Platform clock, seconds
    pub timestamp: f64,
}

/// A touch in view coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub location: Vec2,
    pub view_size: Vec2,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Explicit lane coordinate in [0, 1]
    pub paddle_target: Option<f32>,
    pub crown: Option<CrownSample>,
    /// Overrides the crown for this tick
    pub touch: Option<TouchSample>,
    /// Start a new run from the start screen or game over
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the paddle follows the ball on its own
    pub autopilot: bool,
}

/// Most sub-steps a single ball takes per tick
const MAX_BALL_SUBSTEPS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Contact {
    Paddle { ball_id: u32, normal: Vec2 },
    Brick { ball_id: u32, brick_id: u32 },
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.start && matches!(state.phase, GamePhase::Idle | GamePhase::GameOver) {
        lifecycle::start_new_game(state);
    }

    if input.pause
        && matches!(
            state.phase,
            GamePhase::Countdown | GamePhase::Playing | GamePhase::LevelTransition
        )
    {
        state.paused = !state.paused;
        log::info!("{}", if state.paused { "Paused" } else { "Resumed" });
        return;
    }

    if state.paused || matches!(state.phase, GamePhase::Idle | GamePhase::GameOver) {
        return;
    }

    state.time_ticks += 1;
    state.time += dt as f64;

    apply_input(state, input);

    if !state.rotation.is_in_progress() {
        let lane_length = state.geometry.lane.length();
        state.paddle.move_toward(dt, &state.config, lane_length);
    }
    state.update_anchored_balls();

    let physics_dt = dt * state.physics_speed;
    let mut balls_exited = 0;
    if state.phase == GamePhase::Playing && physics_dt > 0.0 {
        let contacts = step_balls(state, physics_dt);
        for contact in contacts {
            match contact {
                Contact::Paddle { ball_id, normal } => deflect_off_paddle(state, ball_id, normal),
                Contact::Brick { ball_id, brick_id } => {
                    log::trace!("Ball {ball_id} hit brick {brick_id}");
                    hit_brick(state, brick_id);
                }
            }
        }

        update_drops(state, physics_dt);
        update_effects(state, physics_dt);
        stabilize_balls(state);
        balls_exited = remove_exited_balls(state);
    }

    lifecycle::evaluate(state, dt, balls_exited);
    state.normalize_order();
}

/// Fixed-step driver for a variable frame time. One-shot inputs (touch,
/// crown sample, start, pause) are applied on the first sub-step only.
/// Returns the number of ticks run.
pub fn run_frame(state: &mut GameState, input: &TickInput, frame_dt: f32) -> u32 {
    state.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

    let mut input = input.clone();
    let mut steps = 0;
    while state.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
        tick(state, &input, SIM_DT);
        state.accumulator -= SIM_DT;
        steps += 1;

        input.crown = None;
        input.touch = None;
        input.start = false;
        input.pause = false;
    }
    if steps == MAX_SUBSTEPS {
        // Drop the backlog instead of spiralling
        state.accumulator = state.accumulator.min(SIM_DT);
    }
    steps
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    if let Some(sample) = input.crown {
        let position = state.crown.process(sample.value, sample.timestamp);
        state.paddle.set_target(position as f32);
    }
    if let Some(touch) = input.touch {
        let target = state.normalized_target_for_touch(touch.location, touch.view_size);
        state.paddle.set_target(target);
        state.crown.override_position(target as f64, None, None);
    }
    if let Some(target) = input.paddle_target {
        state.paddle.set_target(target);
    }
    if input.autopilot {
        if let Some(target) = autopilot_target(state) {
            state.paddle.set_target(target);
        }
    }
}

/// Lane coordinate the demo paddle heads for: where the lowest descending
/// ball will cross the lane, otherwise the lowest falling drop
pub fn autopilot_target(state: &GameState) -> Option<f32> {
    let lane_y = state.geometry.lane.start.y;
    let bounds = state.geometry.bounds;

    let threat = state
        .balls
        .iter()
        .filter(|b| b.is_free() && b.vel.y < 0.0)
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let x = if let Some(ball) = threat {
        let time_to_lane = ((ball.pos.y - lane_y) / -ball.vel.y).max(0.0);
        let raw = ball.pos.x + ball.vel.x * time_to_lane;
        fold_into(raw, bounds.min().x + ball.radius, bounds.max().x - ball.radius)
    } else {
        state
            .drops
            .iter()
            .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|d| d.pos.x)?
    };

    // Vary the hit point so rallies don't settle into a loop
    let wobble = (state.time as f32 * 0.7).sin() * 0.3 * state.paddle.half_width();
    state.geometry.lane.project(Vec2::new(x + wobble, lane_y))
}

/// Mirror `x` back into [min, max] as if it bounced off both walls
fn fold_into(x: f32, min: f32, max: f32) -> f32 {
    let width = max - min;
    if width <= 0.0 {
        return min;
    }
    let period = width * 2.0;
    let mut t = (x - min).rem_euclid(period);
    if t > width {
        t = period - t;
    }
    min + t
}

/// Move every free ball, resolving wall, brick and paddle contacts.
/// Returns contacts that need gameplay handling, in ball-id order.
fn step_balls(state: &mut GameState, dt: f32) -> Vec<Contact> {
    let paddle_rect = state.paddle.rect(&state.geometry);
    let mut contacts = Vec::new();

    for ball in state.balls.iter_mut().filter(|b| b.is_free()) {
        ball.paddle_cooldown = ball.paddle_cooldown.saturating_sub(1);

        let travel = ball.speed() * dt;
        let steps = ((travel / (ball.radius * 0.5)).ceil() as u32).clamp(1, MAX_BALL_SUBSTEPS);
        let sub_dt = dt / steps as f32;

        for _ in 0..steps {
            ball.pos += ball.vel * sub_dt;

            let wall = ball_polyline_collision(ball.pos, ball.radius, &state.geometry.boundary);
            if wall.hit {
                ball.pos += wall.normal * wall.penetration;
                ball.vel = bounce(ball.vel, wall.normal);
            }

            let brick_hit = state
                .bricks
                .iter()
                .map(|b| (b.id, ball_rect_collision(ball.pos, ball.radius, &b.rect)))
                .filter(|(_, c)| c.hit)
                .max_by(|(_, a), (_, b)| a.penetration.total_cmp(&b.penetration));
            if let Some((brick_id, hit)) = brick_hit {
                let approaching = ball.vel.dot(hit.normal) < 0.0;
                ball.pos += hit.normal * hit.penetration;
                ball.vel = bounce(ball.vel, hit.normal);
                let contact = Contact::Brick {
                    ball_id: ball.id,
                    brick_id,
                };
                if approaching && !contacts.contains(&contact) {
                    contacts.push(contact);
                }
            }

            if ball.paddle_cooldown == 0 {
                let hit = ball_rect_collision(ball.pos, ball.radius, &paddle_rect);
                if hit.hit {
                    ball.pos += hit.normal * hit.penetration;
                    ball.vel = bounce(ball.vel, hit.normal);
                    ball.paddle_cooldown = PADDLE_COOLDOWN_TICKS;
                    contacts.push(Contact::Paddle {
                        ball_id: ball.id,
                        normal: hit.normal,
                    });
                }
            }
        }
    }

    state.keep_balls_inside();
    contacts
}

/// Paddle bounce: the top face maps the hit offset to an outgoing angle,
/// any other face sends the ball back along the contact normal
fn deflect_off_paddle(state: &mut GameState, ball_id: u32, normal: Vec2) {
    let center = state.paddle.center(&state.geometry);
    let half_width = state.paddle.half_width().max(1e-3);
    let speed_floor = state.run.launch_speed(&state.config);

    let Some(ball) = state.balls.iter_mut().find(|b| b.id == ball_id) else {
        return;
    };
    let speed = ball.speed().max(speed_floor);
    ball.vel = if normal.y > 0.0 {
        let offset = ((ball.pos.x - center.x) / half_width).clamp(-1.0, 1.0);
        crate::direction(FRAC_PI_2 + offset * FRAC_PI_4) * speed
    } else {
        normal * speed
    };

    state.emit_cue(Cue::PaddleHit);
    if state.run.register_hit(&state.config) {
        state.emit_hud();
    }
}

fn hit_brick(state: &mut GameState, brick_id: u32) {
    // Already removed by an explosion earlier in this tick
    let Some(index) = state.bricks.iter().position(|b| b.id == brick_id) else {
        return;
    };
    let brick = &mut state.bricks[index];
    if !brick.kind.is_breakable() {
        return;
    }
    if brick.apply_hit() {
        destroy_brick(state, index);
    } else if state.run.register_hit(&state.config) {
        state.emit_hud();
    }
}

/// Remove a brick, award points, release its drop and run the explosion
/// chain for explosive bricks
pub fn destroy_brick(state: &mut GameState, index: usize) {
    let brick = state.bricks.remove(index);
    let multiplier = state.run.multiplier as u64;
    let explosive = brick.kind == BrickKind::Explosive;

    let mut points = brick.kind.base_score(&state.config);
    if explosive {
        points += state.config.score_chain_bonus;
    }
    state.add_score(points * multiplier);
    state.emit(GameEvent::BrickDestroyed {
        pos: brick.rect.center,
        kind: brick.kind,
        chained: false,
    });
    state.emit_cue(Cue::BrickBreak);
    if let Some(kind) = brick.drop {
        spawn_drop(state, kind, brick.rect.center);
    }

    if !explosive {
        return;
    }
    let radius = state.config.explosion_chain_radius;
    let origin = brick.rect.center;
    let (chained, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.bricks)
        .into_iter()
        .partition(|b| b.kind.is_breakable() && b.rect.center.distance(origin) <= radius);
    state.bricks = kept;

    for brick in chained {
        state.add_score(brick.kind.base_score(&state.config) * multiplier);
        state.emit(GameEvent::BrickDestroyed {
            pos: brick.rect.center,
            kind: brick.kind,
            chained: true,
        });
        if let Some(kind) = brick.drop {
            spawn_drop(state, kind, brick.rect.center);
        }
    }
}

fn spawn_drop(state: &mut GameState, kind: DropKind, pos: Vec2) {
    let id = state.next_entity_id();
    state.drops.push(FallingDrop {
        id,
        kind,
        pos,
        size: state.config.drop_size,
    });
    state.emit(GameEvent::DropSpawned { pos, kind });
}

/// Drops fall toward the lane; the paddle catches them, the floor eats them
fn update_drops(state: &mut GameState, dt: f32) {
    if state.drops.is_empty() {
        return;
    }
    let catch_zone = state
        .paddle
        .rect(&state.geometry)
        .inset(state.config.drop_catch_inset);
    let fall = state.config.drop_fall_speed * dt;
    let floor = state.geometry.bounds.min().y - state.config.drop_size;

    let mut caught = Vec::new();
    state.drops.retain_mut(|falling| {
        falling.pos.y -= fall;
        if falling.rect().intersects(&catch_zone) {
            caught.push(falling.kind);
            return false;
        }
        falling.pos.y > floor
    });

    for kind in caught {
        apply_drop(state, kind);
    }
}

pub fn apply_drop(state: &mut GameState, kind: DropKind) {
    state.emit(GameEvent::DropCaught { kind });
    state.emit_cue(Cue::DropCaught);
    log::debug!("Drop caught: {kind:?}");

    let config = &state.config;
    match kind {
        DropKind::ExtraLife => {
            state.run.lives = (state.run.lives + 1).min(config.max_lives);
            state.emit_hud();
        }
        DropKind::MultiBall { count } => spawn_multiball(state, count),
        DropKind::PaddleGrow => {
            state.paddle.set_width_multiplier(config.paddle_grow_multiplier);
            state.effects.paddle_timer = config.paddle_effect_duration;
        }
        DropKind::PaddleShrink => {
            state.paddle.set_width_multiplier(config.paddle_shrink_multiplier);
            state.effects.paddle_timer = config.paddle_effect_duration;
        }
        DropKind::Rotation { angle } => {
            rotation::request_rotation(state, angle);
        }
        DropKind::Points { amount } => {
            let points = amount * state.run.multiplier as u64;
            state.add_score(points);
        }
        DropKind::Gun => {
            state.effects.gun_timer = config.gun_effect_duration;
            state.effects.gun_cooldown = 0.0;
        }
    }
}

/// Spawn `count` extra balls fanned around the primary ball's heading
pub fn spawn_multiball(state: &mut GameState, count: u32) {
    let launch_speed = state.run.launch_speed(&state.config);
    let fallback = (
        state.paddle.launch_point(&state.geometry, state.config.ball_radius),
        crate::direction(FRAC_PI_2) * launch_speed,
    );
    let source = state
        .balls
        .iter()
        .filter(|b| b.is_free())
        .max_by_key(|b| b.primary)
        .map(|b| (b.pos, b.vel))
        .unwrap_or(fallback);

    let base_vel = if source.1.length_squared() > 1e-6 { source.1 } else { fallback.1 };
    let speed = base_vel.length().max(launch_speed);
    let base_angle = base_vel.y.atan2(base_vel.x);
    let spread = state.config.multiball_spread;

    for i in 0..count {
        let side = if i % 2 == 0 { 1.0 } else { -1.0 };
        let ring = (i / 2 + 1) as f32;
        let angle = base_angle + side * ring * spread;

        let id = state.next_entity_id();
        let mut ball = Ball::new(id, state.config.ball_radius);
        ball.pos = source.0;
        ball.launch(angle, speed);
        let vel = ball.vel;
        state.balls.push(ball);
        state.emit(GameEvent::BallLaunched { ball_id: id, vel });
    }
}

fn update_effects(state: &mut GameState, dt: f32) {
    if state.effects.paddle_timer > 0.0 {
        state.effects.paddle_timer -= dt;
        if state.effects.paddle_timer <= 0.0 {
            state.effects.paddle_timer = 0.0;
            state.paddle.set_width_multiplier(1.0);
        }
    }

    if state.effects.gun_active() {
        state.effects.gun_timer = (state.effects.gun_timer - dt).max(0.0);
        state.effects.gun_cooldown -= dt;
        if state.effects.gun_cooldown <= 0.0 {
            fire_gun(state);
            state.effects.gun_cooldown = state.config.gun_fire_interval;
        }
    }
}

/// Vertical beam from the paddle's top; destroys the first breakable brick
/// it meets, stops at an unbreakable one
pub fn fire_gun(state: &mut GameState) {
    let paddle = state.paddle.rect(&state.geometry);
    let from = Vec2::new(paddle.center.x, paddle.max().y);

    let target = state
        .bricks
        .iter()
        .enumerate()
        .filter_map(|(i, b)| raycast_up(from, &b.rect).map(|d| (d, i, b.kind.is_breakable())))
        .min_by(|a, b| a.0.total_cmp(&b.0));

    let to = match target {
        Some((distance, ..)) => from + Vec2::Y * distance,
        None => Vec2::new(from.x, state.geometry.bounds.max().y),
    };
    state.emit(GameEvent::GunFired { from, to });

    if let Some((_, index, true)) = target {
        destroy_brick(state, index);
    }
}

/// Unstick axis-aligned balls and keep speeds inside the run's band
fn stabilize_balls(state: &mut GameState) {
    let min_speed = state.run.min_speed(&state.config);
    let max_speed = state.run.max_speed(&state.config);
    let dislodge_floor = state.run.launch_speed(&state.config);

    for ball in state.balls.iter_mut().filter(|b| b.is_free()) {
        ball.dislodge(&state.config, &mut state.rng, dislodge_floor);
        ball.enforce_min_speed(min_speed);
        ball.clamp_velocity(max_speed);
    }
}

/// Drop balls that passed the lane edge; promote a survivor to primary.
/// Returns how many were removed.
fn remove_exited_balls(state: &mut GameState) -> usize {
    let tolerance = state.config.exit_tolerance;
    let before = state.balls.len();
    let mut lost_primary = false;

    let geometry = &state.geometry;
    state.balls.retain(|ball| {
        let out = ball.is_free() && geometry.exit_depth(ball.pos) > tolerance;
        lost_primary |= out && ball.primary;
        !out
    });

    if lost_primary {
        if let Some(next) = state.balls.iter_mut().find(|b| b.is_free()) {
            next.primary = true;
        }
    }
    before - state.balls.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::sim::geometry::Rect;
    use crate::sim::state::{BallState, Brick};

    fn playing() -> GameState {
        let mut state = GameState::new(GameConfig::default(), Vec2::new(198.0, 230.0), 12345);
        lifecycle::start_new_game(&mut state);
        state.scheduler.cancel_all();
        state.phase = GamePhase::Playing;
        for ball in &mut state.balls {
            ball.state = BallState::Free;
        }
        state.drain_events();
        state
    }

    fn add_brick(state: &mut GameState, kind: BrickKind, center: Vec2) -> u32 {
        let id = state.next_entity_id();
        state.bricks.push(Brick {
            id,
            kind,
            hit_points: kind.hit_points(),
            anchor: Vec2::ZERO,
            rect: Rect::new(center, Vec2::new(12.5, 8.0)),
            drop: None,
        });
        id
    }

    #[test]
    fn test_start_input_from_idle() {
        let mut state = GameState::new(GameConfig::default(), Vec2::new(198.0, 230.0), 1);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.time_ticks, 0);

        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.run.level, 1);
    }

    #[test]
    fn test_countdown_reaches_play() {
        let mut state = GameState::new(GameConfig::default(), Vec2::new(198.0, 230.0), 1);
        lifecycle::start_new_game(&mut state);
        let input = TickInput::default();
        for _ in 0..400 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.balls.iter().all(|b| b.is_free()));
    }

    #[test]
    fn test_tick_pause() {
        let mut state = playing();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert!(state.paused);

        let pos = state.balls[0].pos;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.balls[0].pos, pos);

        tick(&mut state, &pause, SIM_DT);
        assert!(!state.paused);
    }

    #[test]
    fn test_paddle_top_hit_maps_offset_to_angle() {
        let mut state = playing();
        let center = state.paddle.center(&state.geometry);
        let half = state.paddle.half_width();
        let ball = &mut state.balls[0];
        ball.pos = center + Vec2::new(half, 12.0);
        ball.vel = Vec2::new(0.0, -300.0);
        let id = ball.id;

        deflect_off_paddle(&mut state, id, Vec2::Y);
        let vel = state.balls[0].vel;
        let angle = vel.y.atan2(vel.x);
        assert!((angle - 3.0 * FRAC_PI_4).abs() < 1e-4, "right edge sends the ball back left");
        assert!(vel.x < 0.0 && vel.y > 0.0);
        assert!((vel.length() - 300.0).abs() < 1e-2);
        assert_eq!(state.run.streak, 1);
    }

    #[test]
    fn test_paddle_left_edge_and_center_hits() {
        let mut state = playing();
        let center = state.paddle.center(&state.geometry);
        let half = state.paddle.half_width();
        let id = state.balls[0].id;

        state.balls[0].pos = center + Vec2::new(-half, 12.0);
        state.balls[0].vel = Vec2::new(0.0, -300.0);
        deflect_off_paddle(&mut state, id, Vec2::Y);
        let vel = state.balls[0].vel;
        assert!((vel.y.atan2(vel.x) - FRAC_PI_4).abs() < 1e-4);

        state.balls[0].pos = center + Vec2::new(0.0, 12.0);
        state.balls[0].vel = Vec2::new(0.0, -300.0);
        deflect_off_paddle(&mut state, id, Vec2::Y);
        let vel = state.balls[0].vel;
        assert!(vel.x.abs() < 1e-3 && vel.y > 0.0);
    }

    #[test]
    fn test_paddle_underside_reflects_along_normal() {
        let mut state = playing();
        let id = state.balls[0].id;
        state.balls[0].vel = Vec2::new(0.0, 100.0);
        deflect_off_paddle(&mut state, id, Vec2::NEG_Y);
        let vel = state.balls[0].vel;
        assert!(vel.x.abs() < 1e-4);
        assert!((vel.y + 220.0).abs() < 1e-2);
    }

    #[test]
    fn test_explosive_chain_scoring() {
        let mut state = playing();
        state.bricks.clear();
        let explosive = add_brick(&mut state, BrickKind::Explosive, Vec2::new(0.0, 50.0));
        add_brick(&mut state, BrickKind::Tough, Vec2::new(31.0, 50.0));
        add_brick(&mut state, BrickKind::Standard, Vec2::new(-31.0, 50.0));
        add_brick(&mut state, BrickKind::Unbreakable, Vec2::new(0.0, 28.0));
        add_brick(&mut state, BrickKind::Standard, Vec2::new(90.0, 50.0));
        state.run.multiplier = 2;

        hit_brick(&mut state, explosive);

        assert_eq!(state.run.score, (150 + 75) * 2 + 200 * 2 + 100 * 2);
        let kinds: Vec<_> = state.bricks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BrickKind::Unbreakable, BrickKind::Standard]);
        let chained = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::BrickDestroyed { chained: true, .. }))
            .count();
        assert_eq!(chained, 2);
    }

    #[test]
    fn test_tough_brick_survivor_counts_toward_streak() {
        let mut state = playing();
        state.bricks.clear();
        let id = add_brick(&mut state, BrickKind::Tough, Vec2::new(0.0, 50.0));
        hit_brick(&mut state, id);
        hit_brick(&mut state, id);
        assert_eq!(state.run.streak, 2);
        assert_eq!(state.run.score, 0);
        hit_brick(&mut state, id);
        assert!(state.bricks.is_empty());
        assert_eq!(state.run.score, 200);
    }

    #[test]
    fn test_clearing_last_brick_triggers_one_transition() {
        let mut state = playing();
        state.bricks.clear();
        let id = add_brick(&mut state, BrickKind::Standard, Vec2::new(0.0, 50.0));
        add_brick(&mut state, BrickKind::Unbreakable, Vec2::new(40.0, 50.0));
        hit_brick(&mut state, id);

        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::LevelTransition);
        let clears = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::Cue(Cue::LevelClear))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn test_ball_past_lane_costs_a_life() {
        let mut state = playing();
        let floor = state.geometry.bounds.min().y;
        state.balls[0].pos = Vec2::new(0.0, floor - 60.0);
        state.balls[0].vel = Vec2::new(0.0, -200.0);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.run.lives, 2);
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.balls.len(), 1);
        assert!(!state.balls[0].is_free());
    }

    #[test]
    fn test_losing_one_of_several_balls_keeps_the_life() {
        let mut state = playing();
        spawn_multiball(&mut state, 2);
        assert_eq!(state.balls.len(), 3);

        let floor = state.geometry.bounds.min().y;
        state.balls[0].pos = Vec2::new(0.0, floor - 60.0);
        state.balls[0].vel = Vec2::new(0.0, -200.0);
        for ball in state.balls.iter_mut().skip(1) {
            ball.pos = Vec2::new(0.0, 0.0);
            ball.vel = Vec2::new(100.0, 150.0);
        }

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.run.lives, 3);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.balls.len(), 2);
        assert_eq!(state.balls.iter().filter(|b| b.primary).count(), 1);
    }

    #[test]
    fn test_multiball_fans_out() {
        let mut state = playing();
        state.balls[0].vel = Vec2::new(0.0, 300.0);
        spawn_multiball(&mut state, 3);
        let angles: Vec<f32> = state.balls[1..].iter().map(|b| b.vel.y.atan2(b.vel.x)).collect();
        assert!((angles[0] - (FRAC_PI_2 + 0.35)).abs() < 1e-4);
        assert!((angles[1] - (FRAC_PI_2 - 0.35)).abs() < 1e-4);
        assert!((angles[2] - (FRAC_PI_2 + 0.7)).abs() < 1e-4);
        assert!(state.balls[1..].iter().all(|b| !b.primary && b.is_free()));
    }

    #[test]
    fn test_gun_stops_at_unbreakable() {
        let mut state = playing();
        state.bricks.clear();
        let x = state.paddle.center(&state.geometry).x;
        add_brick(&mut state, BrickKind::Unbreakable, Vec2::new(x, 0.0));
        add_brick(&mut state, BrickKind::Standard, Vec2::new(x, 40.0));
        fire_gun(&mut state);
        assert_eq!(state.bricks.len(), 2);

        state.bricks.remove(0);
        fire_gun(&mut state);
        assert!(state.bricks.is_empty());
        assert_eq!(state.run.score, 100);
    }

    #[test]
    fn test_drops_apply_effects() {
        let mut state = playing();
        apply_drop(&mut state, DropKind::ExtraLife);
        assert_eq!(state.run.lives, 4);
        for _ in 0..10 {
            apply_drop(&mut state, DropKind::ExtraLife);
        }
        assert_eq!(state.run.lives, 6);

        apply_drop(&mut state, DropKind::PaddleGrow);
        assert_eq!(state.paddle.width_multiplier(), 2.0);
        state.run.multiplier = 3;
        apply_drop(&mut state, DropKind::Points { amount: 1_000 });
        assert_eq!(state.run.score, 3_000);

        apply_drop(&mut state, DropKind::Rotation { angle: FRAC_PI_2 });
        assert!(matches!(state.rotation, rotation::RotationState::Pending { .. }));
    }

    #[test]
    fn test_paddle_effect_expires() {
        let mut state = playing();
        apply_drop(&mut state, DropKind::PaddleShrink);
        assert_eq!(state.paddle.width_multiplier(), 0.5);
        update_effects(&mut state, 8.5);
        assert_eq!(state.paddle.width_multiplier(), 1.0);
    }

    #[test]
    fn test_caught_drop_is_consumed() {
        let mut state = playing();
        let center = state.paddle.center(&state.geometry);
        spawn_drop(&mut state, DropKind::Gun, center + Vec2::new(0.0, 4.0));
        update_drops(&mut state, SIM_DT);
        assert!(state.drops.is_empty());
        assert!(state.effects.gun_active());
    }

    #[test]
    fn test_missed_drop_falls_away() {
        let mut state = playing();
        let floor = state.geometry.bounds.min().y;
        spawn_drop(&mut state, DropKind::ExtraLife, Vec2::new(-80.0, floor - 10.0));
        state.paddle.position = 1.0;
        update_drops(&mut state, 1.0);
        assert!(state.drops.is_empty());
        assert_eq!(state.run.lives, 3);
    }

    #[test]
    fn test_run_frame_caps_substeps() {
        let mut state = playing();
        let ticks = run_frame(&mut state, &TickInput::default(), 1.0);
        assert_eq!(ticks, MAX_SUBSTEPS);
        assert!(state.accumulator <= SIM_DT);
    }

    #[test]
    fn test_fold_into_reflects() {
        assert_eq!(fold_into(5.0, 0.0, 10.0), 5.0);
        assert_eq!(fold_into(12.0, 0.0, 10.0), 8.0);
        assert_eq!(fold_into(-3.0, 0.0, 10.0), 3.0);
    }

    #[test]
    fn test_determinism() {
        let config = GameConfig::default();
        let mut a = GameState::new(config.clone(), Vec2::new(198.0, 230.0), 777);
        let mut b = GameState::new(config, Vec2::new(198.0, 230.0), 777);
        let input = TickInput {
            start: true,
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..3_000 {
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(a.run, b.run);
        assert_eq!(a.balls.len(), b.balls.len());
        for (x, y) in a.balls.iter().zip(&b.balls) {
            assert_eq!(x.pos, y.pos);
        }
    }
}
