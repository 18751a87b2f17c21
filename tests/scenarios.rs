//! Whole-run scenarios driven through `tick` with scripted input

use glam::Vec2;
use proptest::prelude::*;
use std::f32::consts::FRAC_PI_2;

use rotabrix::consts::SIM_DT;
use rotabrix::sim::{
    GamePhase, GameState, Orientation, RunState, TickInput, request_rotation, start_new_game, tick,
};
use rotabrix::{EventSink, GameConfig, GameEvent};

const SCENE: Vec2 = Vec2::new(198.0, 230.0);

fn ticks(state: &mut GameState, input: &TickInput, n: usize) {
    for _ in 0..n {
        tick(state, input, SIM_DT);
    }
}

/// Start a run and tick until the first serve
fn serve(seed: u64) -> GameState {
    let mut state = GameState::new(GameConfig::default(), SCENE, seed);
    start_new_game(&mut state);
    let input = TickInput::default();
    for _ in 0..1_000 {
        if state.phase == GamePhase::Playing {
            break;
        }
        tick(&mut state, &input, SIM_DT);
    }
    assert_eq!(state.phase, GamePhase::Playing);
    state
}

fn messages(events: &[GameEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Message { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn restart_during_countdown_says_go_once() {
    let mut state = GameState::new(GameConfig::default(), SCENE, 42);
    let start = TickInput {
        start: true,
        ..Default::default()
    };
    tick(&mut state, &start, SIM_DT);
    ticks(&mut state, &TickInput::default(), 100);

    start_new_game(&mut state);
    ticks(&mut state, &TickInput::default(), 600);

    let events = state.drain_events();
    let gos = messages(&events).iter().filter(|m| **m == "Go!").count();
    assert_eq!(gos, 1);
    let starts = events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameStarted { .. }))
        .count();
    assert_eq!(starts, 2);
}

#[test]
fn rotation_through_ticks_preserves_ball_path() {
    let mut state = serve(9);
    state.run.multiplier = 2;
    assert!(request_rotation(&mut state, FRAC_PI_2));

    tick(&mut state, &TickInput::default(), SIM_DT);
    assert!(state.rotation.is_in_progress());
    let frozen: Vec<Vec2> = state.balls.iter().map(|b| b.vel).collect();
    let events = state.drain_events();
    assert!(messages(&events).contains(&"Rotate +90"));

    // Physics stays frozen through the hold and the sweep
    let pos = state.balls[0].pos;
    ticks(&mut state, &TickInput::default(), 60);
    assert_eq!(state.balls[0].pos, pos);

    for _ in 0..200 {
        if state.rotation.is_stable() {
            break;
        }
        tick(&mut state, &TickInput::default(), SIM_DT);
    }
    assert!(state.rotation.is_stable());
    assert_eq!(state.orientation, Orientation::Right);
    assert_eq!(state.run.multiplier, 1);
    for (ball, before) in state.balls.iter().zip(&frozen) {
        assert!((ball.vel - *before).length() < 1e-3);
    }
    assert!(
        state
            .drain_events()
            .contains(&GameEvent::RotationFinished {
                orientation: Orientation::Right
            })
    );
}

#[test]
fn rotation_request_during_countdown_is_ignored() {
    let mut state = GameState::new(GameConfig::default(), SCENE, 3);
    start_new_game(&mut state);
    assert!(!request_rotation(&mut state, FRAC_PI_2));
    ticks(&mut state, &TickInput::default(), 10);
    assert!(state.rotation.is_stable());
    assert_eq!(state.orientation, Orientation::Bottom);
}

#[derive(Default)]
struct EndWatcher {
    final_score: Option<u64>,
    hidden: bool,
}

impl EventSink for EndWatcher {
    fn on_game_ended(&mut self, final_score: u64) {
        self.final_score = Some(final_score);
    }

    fn on_event(&mut self, event: &GameEvent) {
        if *event == GameEvent::GameplayVisible(false) {
            self.hidden = true;
        }
    }
}

#[test]
fn last_miss_ends_the_run() {
    let mut state = serve(5);
    state.run.lives = 1;
    state.run.score = 4_200;
    let floor = state.geometry.bounds.min().y;
    state.balls[0].pos = Vec2::new(0.0, floor - 60.0);
    state.balls[0].vel = Vec2::new(0.0, -300.0);

    tick(&mut state, &TickInput::default(), SIM_DT);
    assert_eq!(state.phase, GamePhase::GameOver);

    let mut watcher = EndWatcher::default();
    state.dispatch_events(&mut watcher);
    assert_eq!(watcher.final_score, Some(4_200));
    assert!(watcher.hidden);

    // Frozen until a new run starts
    let time = state.time;
    ticks(&mut state, &TickInput::default(), 30);
    assert_eq!(state.time, time);

    let start = TickInput {
        start: true,
        ..Default::default()
    };
    tick(&mut state, &start, SIM_DT);
    assert_eq!(state.phase, GamePhase::Countdown);
    assert_eq!(state.run.lives, 3);
}

#[test]
fn config_override_changes_the_run() {
    let config = GameConfig::from_json(r#"{ "lives_per_run": 5 }"#).expect("valid override");
    let mut state = GameState::new(config, SCENE, 1);
    start_new_game(&mut state);
    assert_eq!(state.run.lives, 5);
}

#[test]
fn autopilot_run_keeps_invariants() {
    let config = GameConfig::default();
    let mut state = GameState::new(config.clone(), SCENE, 2024);
    let mut input = TickInput {
        start: true,
        autopilot: true,
        ..Default::default()
    };

    for _ in 0..120 * 120 {
        tick(&mut state, &input, SIM_DT);
        input.start = state.phase == GamePhase::GameOver;

        let run = &state.run;
        assert!((1..=config.max_multiplier).contains(&run.multiplier));
        assert!(run.lives <= config.max_lives);
        let max_speed = run.max_speed(&config) * 1.001;
        for ball in state.balls.iter().filter(|b| b.is_free()) {
            assert!(ball.speed() <= max_speed, "ball {} at {}", ball.id, ball.speed());
        }
        let half = state.paddle.half_width();
        let base = config.base_half_paddle_width();
        assert!(half >= base * 0.2 - 1e-4 && half <= base * 3.0 + 1e-4);
        state.drain_events();
    }
    assert!(state.run.score > 0);
}

#[test]
fn resize_mid_run_keeps_balls_in_bounds() {
    let mut state = serve(77);
    ticks(&mut state, &TickInput::default(), 30);
    state.set_scene_size(Vec2::new(150.0, 180.0));
    let bounds = state.geometry.bounds;
    for ball in state.balls.iter().filter(|b| b.is_free()) {
        assert!(ball.pos.x.abs() <= bounds.half.x);
        assert!(ball.pos.y <= bounds.max().y);
    }
    for brick in &state.bricks {
        assert!(brick.rect.center.x.abs() <= bounds.half.x);
    }
}

proptest! {
    #[test]
    fn multiplier_only_climbs_between_resets(hits in 0u32..200) {
        let config = GameConfig::default();
        let mut run = RunState::new(&config);
        let mut last = run.multiplier;
        for _ in 0..hits {
            run.register_hit(&config);
            prop_assert!(run.multiplier >= last);
            prop_assert!(run.multiplier <= config.max_multiplier);
            last = run.multiplier;
        }
        prop_assert_eq!(run.multiplier, (1 + hits / 6).min(config.max_multiplier));
    }
}
