//! Rotabrix headless demo
//!
//! Plays a run on autopilot at a simulated 60 Hz display and logs what the
//! presentation layer would receive.
//!
//! Usage: `rotabrix [seed] [config.json]` (set `RUST_LOG=info` for event output)

#[cfg(not(target_arch = "wasm32"))]
use rotabrix::{Cue, EventSink, GameConfig, GameEvent, HudSnapshot};

/// Forwards drained events to the log
#[cfg(not(target_arch = "wasm32"))]
#[derive(Default)]
struct LogSink {
    final_score: Option<u64>,
    cues: usize,
    last_hud: Option<HudSnapshot>,
}

#[cfg(not(target_arch = "wasm32"))]
impl EventSink for LogSink {
    fn on_game_started(&mut self, initial_score: u64) {
        log::info!("Game started with score {initial_score}");
    }

    fn on_game_ended(&mut self, final_score: u64) {
        log::info!("Game ended with score {final_score}");
        self.final_score = Some(final_score);
    }

    fn on_hud(&mut self, hud: &HudSnapshot) {
        self.last_hud = Some(*hud);
    }

    fn on_message(&mut self, text: &str, duration: f32) {
        log::info!("[banner {duration:.1}s] {text}");
    }

    fn on_cue(&mut self, cue: Cue) {
        log::trace!("cue {cue:?}");
        self.cues += 1;
    }

    fn on_event(&mut self, event: &GameEvent) {
        log::debug!("{event:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config(path: Option<&str>) -> Result<GameConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(GameConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(GameConfig::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use rotabrix::sim::{GamePhase, GameState, TickInput, run_frame};

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(0x5EED);
    let config = match load_config(args.get(1).map(String::as_str)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Could not load config: {err}");
            std::process::exit(1);
        }
    };

    log::info!("Rotabrix demo starting (seed {seed})");
    let mut state = GameState::new(config, Vec2::new(198.0, 230.0), seed);
    let mut sink = LogSink::default();

    // Ten simulated minutes at 60 fps, or until the run ends
    let frame_dt = 1.0 / 60.0;
    let mut input = TickInput {
        start: true,
        autopilot: true,
        ..Default::default()
    };
    for _ in 0..60 * 600 {
        run_frame(&mut state, &input, frame_dt);
        input.start = false;
        state.dispatch_events(&mut sink);
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    let hud = sink.last_hud.unwrap_or_else(|| state.hud());
    println!(
        "score {} | level {} | lives {} | x{} | {} cues | {:.1}s simulated",
        sink.final_score.unwrap_or(hud.score),
        hud.level,
        hud.lives,
        hud.multiplier,
        sink.cues,
        state.time
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by the host app; there is no wasm entry point
}
