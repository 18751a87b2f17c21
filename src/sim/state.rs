//! Game state and core simulation types
//!
//! Everything a run needs lives in `GameState`, so a run can be serialized,
//! cloned for replays, and driven purely through `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{PlayfieldGeometry, Rect};
use super::level::{BrickDescriptor, LevelGenerator, LevelLayout};
use super::orientation::{Orientation, PlayfieldTransform};
use super::rotation::{self, RotationState};
use super::schedule::Scheduler;
use crate::config::GameConfig;
use crate::events::{Cue, EventSink, GameEvent, HudSnapshot, dispatch};
use crate::input::CrownInput;
use crate::random::SeededRandom;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing simulated
    #[default]
    Idle,
    /// Ball anchored to the paddle while banners count down
    Countdown,
    Playing,
    /// Between levels; gameplay hidden and frozen
    LevelTransition,
    GameOver,
}

/// Ball state - riding the paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    Anchored,
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub state: BallState,
    /// The ball lives and serves are tracked against
    pub primary: bool,
    /// Ticks before the paddle can be hit again (prevents sticking)
    #[serde(default)]
    pub paddle_cooldown: u32,
}

impl Ball {
    pub fn new(id: u32, radius: f32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            state: BallState::Anchored,
            primary: false,
            paddle_cooldown: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == BallState::Free
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn launch(&mut self, angle: f32, speed: f32) {
        self.vel = crate::direction(angle) * speed;
        self.state = BallState::Free;
    }

    /// Rescale to at most `max_speed`, keeping the direction
    pub fn clamp_velocity(&mut self, max_speed: f32) {
        self.vel = self.vel.clamp_length_max(max_speed);
    }

    /// Raise a slow (but moving) ball to `min_speed`
    pub fn enforce_min_speed(&mut self, min_speed: f32) {
        let speed = self.speed();
        if speed > 1e-6 && speed < min_speed {
            self.vel *= min_speed / speed;
        }
    }

    /// True when one velocity component is a negligible share of the speed
    pub fn is_nearly_axis_aligned(&self, epsilon: f32) -> bool {
        let speed = self.speed();
        if speed <= 1e-6 {
            return false;
        }
        self.vel.x.abs() < epsilon * speed || self.vel.y.abs() < epsilon * speed
    }

    /// Kick a ball that is bouncing straight up/down or side to side onto a
    /// slight diagonal. Returns whether the velocity changed.
    pub fn dislodge(
        &mut self,
        config: &GameConfig,
        rng: &mut SeededRandom,
        min_speed: f32,
    ) -> bool {
        use rand::Rng;

        if !self.is_nearly_axis_aligned(config.dislodge_epsilon) {
            return false;
        }
        let magnitude = rng.random_range(config.dislodge_jitter_min..=config.dislodge_jitter_max);
        let jitter = if rng.random_bool(0.5) { magnitude } else { -magnitude };
        let speed = self.speed().max(min_speed);
        self.vel = crate::rotate_vec(self.vel.normalize_or_zero(), jitter) * speed;
        true
    }
}

pub const MIN_WIDTH_MULTIPLIER: f32 = 0.2;
pub const MAX_WIDTH_MULTIPLIER: f32 = 3.0;

/// The player's paddle, positioned along the lane by a normalized coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Current position along the lane, 0 = left end, 1 = right end
    pub position: f32,
    /// Where the paddle is heading
    pub target: f32,
    width_multiplier: f32,
    base_half_width: f32,
    pub half_height: f32,
}

impl Paddle {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            position: 0.5,
            target: 0.5,
            width_multiplier: 1.0,
            base_half_width: config.base_half_paddle_width(),
            half_height: config.paddle_height / 2.0,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.base_half_width * self.width_multiplier
    }

    pub fn width_multiplier(&self) -> f32 {
        self.width_multiplier
    }

    pub fn set_width_multiplier(&mut self, multiplier: f32) {
        self.width_multiplier = multiplier.clamp(MIN_WIDTH_MULTIPLIER, MAX_WIDTH_MULTIPLIER);
    }

    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target.clamp(0.0, 1.0);
        }
    }

    /// Frame-rate independent ease toward `target`, snapping once close
    pub fn move_toward(&mut self, dt: f32, config: &GameConfig, lane_length: f32) {
        use crate::consts::{PADDLE_MAX_STEP, PADDLE_REFERENCE_FPS};

        let steps = (dt * PADDLE_REFERENCE_FPS).min(PADDLE_MAX_STEP);
        let factor = 1.0 - (1.0 - config.paddle_responsiveness).powf(steps);
        self.position += (self.target - self.position) * factor;
        if (self.target - self.position).abs() * lane_length <= config.paddle_snap_distance {
            self.position = self.target;
        }
    }

    pub fn center(&self, geometry: &PlayfieldGeometry) -> Vec2 {
        geometry.lane.point_at(self.position)
    }

    pub fn rect(&self, geometry: &PlayfieldGeometry) -> Rect {
        Rect::new(self.center(geometry), Vec2::new(self.half_width(), self.half_height))
    }

    /// Where an anchored ball sits
    pub fn launch_point(&self, geometry: &PlayfieldGeometry, ball_radius: f32) -> Vec2 {
        self.center(geometry) + Vec2::new(0.0, self.half_height + ball_radius + 2.0)
    }
}

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickKind {
    #[default]
    Standard,
    Tough,
    /// Destroys nearby bricks when it breaks
    Explosive,
    /// Cannot be destroyed, doesn't count for level clear
    Unbreakable,
}

impl BrickKind {
    pub fn hit_points(self) -> u32 {
        match self {
            BrickKind::Standard | BrickKind::Explosive => 1,
            BrickKind::Tough => 3,
            BrickKind::Unbreakable => u32::MAX,
        }
    }

    pub fn base_score(self, config: &GameConfig) -> u64 {
        match self {
            BrickKind::Standard => config.score_standard_brick,
            BrickKind::Tough => config.score_tough_brick,
            BrickKind::Explosive => config.score_explosive_brick,
            BrickKind::Unbreakable => 0,
        }
    }

    pub fn is_breakable(self) -> bool {
        self != BrickKind::Unbreakable
    }
}

/// Power-ups released by destroyed bricks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DropKind {
    ExtraLife,
    MultiBall { count: u32 },
    PaddleGrow,
    PaddleShrink,
    /// Requests a playfield turn by `angle` radians
    Rotation { angle: f32 },
    Points { amount: u64 },
    Gun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub kind: BrickKind,
    pub hit_points: u32,
    /// Center relative to the playfield, each axis in [-1, 1]
    pub anchor: Vec2,
    pub rect: Rect,
    pub drop: Option<DropKind>,
}

impl Brick {
    pub fn from_descriptor(
        id: u32,
        layout: &LevelLayout,
        descriptor: &BrickDescriptor,
        bounds: &Rect,
    ) -> Self {
        let mut brick = Self {
            id,
            kind: descriptor.kind,
            hit_points: descriptor.kind.hit_points(),
            anchor: layout.normalized_center(descriptor),
            rect: descriptor.frame,
            drop: descriptor.drop,
        };
        brick.relayout(bounds);
        brick
    }

    /// Re-derive the absolute position inside `bounds`
    pub fn relayout(&mut self, bounds: &Rect) {
        self.rect.center = bounds.center + self.anchor * bounds.half;
    }

    /// Take one hit; true once the brick is destroyed
    pub fn apply_hit(&mut self) -> bool {
        if !self.kind.is_breakable() {
            return false;
        }
        self.hit_points = self.hit_points.saturating_sub(1);
        self.hit_points == 0
    }
}

/// A power-up falling toward the paddle lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingDrop {
    pub id: u32,
    pub kind: DropKind,
    pub pos: Vec2,
    pub size: f32,
}

impl FallingDrop {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(self.size / 2.0))
    }
}

/// Timed power-up effects (seconds remaining)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub paddle_timer: f32,
    pub gun_timer: f32,
    pub gun_cooldown: f32,
}

impl ActiveEffects {
    pub fn gun_active(&self) -> bool {
        self.gun_timer > 0.0
    }
}

/// Score, lives and pacing for the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub score: u64,
    pub multiplier: u32,
    /// Consecutive hits since the multiplier last reset
    pub streak: u32,
    pub lives: u32,
    pub level: u32,
    /// Seconds since the last timed rotation
    pub rotation_timer: f32,
    pub rotation_interval: f32,
    /// Grows each level; scales launch, floor and ceiling speeds
    pub speed_multiplier: f32,
}

impl RunState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            multiplier: 1,
            streak: 0,
            lives: config.lives_per_run,
            level: 0,
            rotation_timer: 0.0,
            rotation_interval: config.rotation_base_interval,
            speed_multiplier: 1.0,
        }
    }

    /// Count a successful hit. Returns true if the multiplier went up.
    pub fn register_hit(&mut self, config: &GameConfig) -> bool {
        self.streak += 1;
        let hits = config.hits_per_multiplier.max(1);
        if self.streak % hits == 0 && self.multiplier < config.max_multiplier {
            self.multiplier += 1;
            return true;
        }
        false
    }

    pub fn reset_combo(&mut self) {
        self.multiplier = 1;
        self.streak = 0;
    }

    pub fn launch_speed(&self, config: &GameConfig) -> f32 {
        config.ball_initial_speed * self.speed_multiplier
    }

    pub fn min_speed(&self, config: &GameConfig) -> f32 {
        self.launch_speed(config) * config.ball_min_speed_factor
    }

    pub fn max_speed(&self, config: &GameConfig) -> f32 {
        config.ball_maximum_speed * self.speed_multiplier
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub config: GameConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: SeededRandom,
    pub phase: GamePhase,
    pub paused: bool,
    pub run: RunState,
    pub orientation: Orientation,
    pub geometry: PlayfieldGeometry,
    pub paddle: Paddle,
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Active bricks (sorted by id for determinism)
    pub bricks: Vec<Brick>,
    pub drops: Vec<FallingDrop>,
    pub effects: ActiveEffects,
    pub crown: CrownInput,
    pub levels: LevelGenerator,
    pub rotation: RotationState,
    pub scheduler: Scheduler,
    /// 0 while frozen (rotation, countdown holds), 1 otherwise
    pub physics_speed: f32,
    pub gameplay_visible: bool,
    /// Simulation clock in seconds
    pub time: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Fixed-step accumulator for `run_frame`
    #[serde(skip)]
    pub(crate) accumulator: f32,
    #[serde(skip)]
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create an idle game for a scene of `scene_size` points
    pub fn new(config: GameConfig, scene_size: Vec2, seed: u64) -> Self {
        let orientation = Orientation::Bottom;
        Self {
            geometry: PlayfieldGeometry::new(&config, scene_size, orientation),
            paddle: Paddle::new(&config),
            run: RunState::new(&config),
            crown: CrownInput::from_config(&config),
            config,
            seed,
            rng: SeededRandom::new(seed),
            phase: GamePhase::Idle,
            paused: false,
            orientation,
            balls: Vec::new(),
            bricks: Vec::new(),
            drops: Vec::new(),
            effects: ActiveEffects::default(),
            levels: LevelGenerator::new(),
            rotation: RotationState::Stable,
            scheduler: Scheduler::new(),
            physics_speed: 1.0,
            gameplay_visible: false,
            time: 0.0,
            time_ticks: 0,
            accumulator: 0.0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn emit_cue(&mut self, cue: Cue) {
        self.emit(GameEvent::Cue(cue));
    }

    pub fn emit_message(&mut self, text: impl Into<String>, duration: f32) {
        self.emit(GameEvent::Message {
            text: text.into(),
            duration,
        });
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.run.score,
            multiplier: self.run.multiplier,
            lives: self.run.lives,
            level: self.run.level,
        }
    }

    pub fn emit_hud(&mut self) {
        let hud = self.hud();
        self.emit(GameEvent::Hud(hud));
    }

    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.run.score = self.run.score.saturating_add(points);
        self.emit(GameEvent::ScoreChanged { score: self.run.score });
    }

    /// Events queued since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain the queue into `sink`
    pub fn dispatch_events(&mut self, sink: &mut impl EventSink) {
        for event in self.drain_events() {
            dispatch(&event, sink);
        }
    }

    /// Current container rotation, including a sweep in progress
    pub fn container_transform(&self) -> PlayfieldTransform {
        rotation::container_transform(self)
    }

    /// Rebuild geometry for the current scene size and orientation, then
    /// move everything that depends on it
    pub fn rebuild_geometry(&mut self) {
        self.geometry =
            PlayfieldGeometry::new(&self.config, self.geometry.scene_size, self.orientation);
        let bounds = self.geometry.bounds;
        for brick in &mut self.bricks {
            brick.relayout(&bounds);
        }
        self.update_anchored_balls();
        self.keep_balls_inside();
    }

    /// The host view changed size
    pub fn set_scene_size(&mut self, scene_size: Vec2) {
        if !(scene_size.x.is_finite() && scene_size.y.is_finite())
            || scene_size.cmple(Vec2::ZERO).any()
        {
            log::debug!("Ignoring scene size {scene_size}");
            return;
        }
        if scene_size == self.geometry.scene_size {
            return;
        }
        self.geometry.scene_size = scene_size;
        self.drops.clear();
        self.rebuild_geometry();
    }

    /// Lane coordinate for a touch at `location` in a view of `view_size`
    /// (view origin top-left, y down). Falls back to the current target for
    /// an empty view.
    pub fn normalized_target_for_touch(&self, location: Vec2, view_size: Vec2) -> f32 {
        if view_size.x <= 0.0 || view_size.y <= 0.0 {
            return self.paddle.target;
        }
        let scene = self.geometry.scene_size;
        let world = Vec2::new(
            location.x / view_size.x * scene.x - scene.x / 2.0,
            (1.0 - location.y / view_size.y) * scene.y - scene.y / 2.0,
        );
        let local = self.container_transform().to_local(world);
        self.geometry.lane.project(local).unwrap_or(self.paddle.target)
    }

    pub fn update_paddle_target(&mut self, target: f32) {
        self.paddle.set_target(target);
    }

    pub fn spawn_anchored_ball(&mut self) -> u32 {
        let id = self.next_entity_id();
        let mut ball = Ball::new(id, self.config.ball_radius);
        ball.primary = true;
        ball.pos = self.paddle.launch_point(&self.geometry, ball.radius);
        self.balls.push(ball);
        id
    }

    /// Keep anchored balls riding on the paddle
    pub fn update_anchored_balls(&mut self) {
        let radius = self.config.ball_radius;
        let point = self.paddle.launch_point(&self.geometry, radius);
        for ball in &mut self.balls {
            if ball.state == BallState::Anchored {
                ball.pos = point;
            }
        }
    }

    /// Pull free balls back inside the side and top walls (after a resize
    /// or an orientation change shrank the playfield)
    pub fn keep_balls_inside(&mut self) {
        let bounds = self.geometry.bounds;
        if bounds.is_degenerate() {
            return;
        }
        for ball in self.balls.iter_mut().filter(|b| b.is_free()) {
            let min = bounds.min() + Vec2::splat(ball.radius);
            let max = bounds.max() - Vec2::splat(ball.radius);
            if ball.pos.x < min.x || ball.pos.x > max.x {
                ball.pos.x = ball.pos.x.clamp(min.x, max.x.max(min.x));
            }
            if ball.pos.y > max.y {
                ball.pos.y = max.y;
            }
        }
    }

    pub fn has_breakable_bricks(&self) -> bool {
        self.bricks.iter().any(|b| b.kind.is_breakable())
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.bricks.sort_by_key(|b| b.id);
        self.drops.sort_by_key(|d| d.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(config(), Vec2::new(198.0, 230.0), 7);
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.balls.is_empty());
        assert_eq!(state.run.lives, 3);
        assert_eq!(state.run.multiplier, 1);
    }

    #[test]
    fn test_multiplier_steps_every_six_hits() {
        let config = config();
        let mut run = RunState::new(&config);
        for _ in 0..5 {
            assert!(!run.register_hit(&config));
        }
        assert!(run.register_hit(&config));
        assert_eq!(run.multiplier, 2);

        for _ in 0..200 {
            run.register_hit(&config);
        }
        assert_eq!(run.multiplier, config.max_multiplier);
    }

    #[test]
    fn test_tough_brick_takes_three_hits() {
        let mut brick = Brick {
            id: 1,
            kind: BrickKind::Tough,
            hit_points: BrickKind::Tough.hit_points(),
            anchor: Vec2::ZERO,
            rect: Rect::default(),
            drop: None,
        };
        assert!(!brick.apply_hit());
        assert!(!brick.apply_hit());
        assert!(brick.apply_hit());
    }

    #[test]
    fn test_unbreakable_never_breaks() {
        let mut brick = Brick {
            id: 1,
            kind: BrickKind::Unbreakable,
            hit_points: BrickKind::Unbreakable.hit_points(),
            anchor: Vec2::ZERO,
            rect: Rect::default(),
            drop: None,
        };
        for _ in 0..100 {
            assert!(!brick.apply_hit());
        }
        assert_eq!(brick.hit_points, u32::MAX);
    }

    #[test]
    fn test_dislodge_horizontal_ball() {
        let config = config();
        let mut rng = SeededRandom::new(99);
        let mut ball = Ball::new(1, 6.0);
        ball.state = BallState::Free;
        ball.vel = Vec2::new(500.0, 0.0);

        assert!(ball.dislodge(&config, &mut rng, 220.0));
        let angle = ball.vel.y.atan2(ball.vel.x).abs();
        assert!((0.08 - 1e-4..=0.22 + 1e-4).contains(&angle), "angle {angle}");
        assert!((ball.speed() - 500.0).abs() < 1e-2);

        // Already diagonal: untouched
        ball.vel = Vec2::new(300.0, 300.0);
        assert!(!ball.dislodge(&config, &mut rng, 220.0));
    }

    #[test]
    fn test_dislodge_floors_speed() {
        let config = config();
        let mut rng = SeededRandom::new(3);
        let mut ball = Ball::new(1, 6.0);
        ball.vel = Vec2::new(0.0, 40.0);
        assert!(ball.dislodge(&config, &mut rng, 220.0));
        assert!((ball.speed() - 220.0).abs() < 1e-2);
    }

    #[test]
    fn test_touch_maps_to_lane() {
        let state = GameState::new(config(), Vec2::new(198.0, 230.0), 1);
        let view = Vec2::new(198.0, 230.0);
        assert_eq!(state.normalized_target_for_touch(Vec2::new(0.0, 200.0), view), 0.0);
        assert_eq!(state.normalized_target_for_touch(Vec2::new(198.0, 200.0), view), 1.0);
        let middle = state.normalized_target_for_touch(Vec2::new(99.0, 10.0), view);
        assert!((middle - 0.5).abs() < 1e-5);
        assert_eq!(state.normalized_target_for_touch(Vec2::new(10.0, 10.0), Vec2::ZERO), 0.5);
    }

    #[test]
    fn test_set_scene_size_ignores_zero() {
        let mut state = GameState::new(config(), Vec2::new(198.0, 230.0), 1);
        state.set_scene_size(Vec2::ZERO);
        assert_eq!(state.geometry.scene_size, Vec2::new(198.0, 230.0));
        state.set_scene_size(Vec2::new(300.0, 400.0));
        assert_eq!(state.geometry.bounds.width(), 288.0);
    }

    #[test]
    fn test_paddle_eases_then_snaps() {
        let config = config();
        let mut paddle = Paddle::new(&config);
        paddle.set_target(1.0);
        paddle.move_toward(1.0 / 60.0, &config, 170.0);
        assert!((paddle.position - (0.5 + 0.5 * 0.32)).abs() < 1e-5);
        for _ in 0..60 {
            paddle.move_toward(1.0 / 60.0, &config, 170.0);
        }
        assert_eq!(paddle.position, 1.0);
    }

    proptest! {
        #[test]
        fn paddle_half_width_stays_in_range(multiplier in -10.0f32..10.0) {
            let config = GameConfig::default();
            let mut paddle = Paddle::new(&config);
            paddle.set_width_multiplier(multiplier);
            let base = config.base_half_paddle_width();
            prop_assert!(paddle.half_width() >= base * MIN_WIDTH_MULTIPLIER - 1e-4);
            prop_assert!(paddle.half_width() <= base * MAX_WIDTH_MULTIPLIER + 1e-4);
        }

        #[test]
        fn paddle_half_width_scales_exactly_in_range(multiplier in 0.2f32..=3.0) {
            let config = GameConfig::default();
            let mut paddle = Paddle::new(&config);
            paddle.set_width_multiplier(multiplier);
            let base = config.base_half_paddle_width();
            prop_assert_eq!(paddle.half_width(), base * multiplier);
        }

        #[test]
        fn clamp_velocity_keeps_direction(
            x in -2000.0f32..2000.0,
            y in -2000.0f32..2000.0,
            max in 1.0f32..1000.0,
        ) {
            let mut ball = Ball::new(1, 6.0);
            ball.vel = Vec2::new(x, y);
            let before = ball.vel;
            ball.clamp_velocity(max);
            prop_assert!(ball.speed() <= max * (1.0 + 1e-4));
            if before.length() > 1e-3 {
                prop_assert!(before.normalize().dot(ball.vel.normalize_or_zero()) > 0.999);
            }
        }
    }
}
