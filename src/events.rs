//! Events the simulation emits for presentation, audio and leaderboard layers
//!
//! The core only queues events during a tick. The platform drains the queue
//! afterwards, so a sink can never re-enter the simulation mid-step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{BrickKind, DropKind, Orientation};

/// Audio/haptic triggers (best effort, fire-and-forget)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    PaddleHit,
    LifeLost,
    BrickBreak,
    DropCaught,
    LevelClear,
    Rotation,
}

/// Numbers shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub multiplier: u32,
    pub lives: u32,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted { score: u64 },
    ScoreChanged { score: u64 },
    GameEnded { final_score: u64 },
    Hud(HudSnapshot),
    /// Transient banner text
    Message { text: String, duration: f32 },
    Cue(Cue),
    BrickDestroyed { pos: Vec2, kind: BrickKind, chained: bool },
    DropSpawned { pos: Vec2, kind: DropKind },
    DropCaught { kind: DropKind },
    GunFired { from: Vec2, to: Vec2 },
    BallLaunched { ball_id: u32, vel: Vec2 },
    RotationStarted { angle: f32 },
    RotationFinished { orientation: Orientation },
    LevelStarted { level: u32 },
    /// Gameplay layer shown or hidden (start screen, transitions, game over)
    GameplayVisible(bool),
}

/// Receiver for drained events. Every method defaults to a no-op so a sink
/// only implements what it cares about.
pub trait EventSink {
    fn on_game_started(&mut self, _initial_score: u64) {}
    fn on_score_changed(&mut self, _score: u64) {}
    fn on_game_ended(&mut self, _final_score: u64) {}
    fn on_hud(&mut self, _hud: &HudSnapshot) {}
    fn on_message(&mut self, _text: &str, _duration: f32) {}
    fn on_cue(&mut self, _cue: Cue) {}
    /// Everything without a dedicated callback
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Route one event to the matching callback
pub fn dispatch(event: &GameEvent, sink: &mut impl EventSink) {
    match event {
        GameEvent::GameStarted { score } => sink.on_game_started(*score),
        GameEvent::ScoreChanged { score } => sink.on_score_changed(*score),
        GameEvent::GameEnded { final_score } => sink.on_game_ended(*final_score),
        GameEvent::Hud(hud) => sink.on_hud(hud),
        GameEvent::Message { text, duration } => sink.on_message(text, *duration),
        GameEvent::Cue(cue) => sink.on_cue(*cue),
        other => sink.on_event(other),
    }
}

/// Collecting sink, handy for tests and replays
impl EventSink for Vec<GameEvent> {
    fn on_game_started(&mut self, initial_score: u64) {
        self.push(GameEvent::GameStarted { score: initial_score });
    }

    fn on_score_changed(&mut self, score: u64) {
        self.push(GameEvent::ScoreChanged { score });
    }

    fn on_game_ended(&mut self, final_score: u64) {
        self.push(GameEvent::GameEnded { final_score });
    }

    fn on_hud(&mut self, hud: &HudSnapshot) {
        self.push(GameEvent::Hud(*hud));
    }

    fn on_message(&mut self, text: &str, duration: f32) {
        self.push(GameEvent::Message {
            text: text.to_string(),
            duration,
        });
    }

    fn on_cue(&mut self, cue: Cue) {
        self.push(GameEvent::Cue(cue));
    }

    fn on_event(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}
