//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies
//!
//! Positions and velocities live in the playfield-local frame, where the
//! paddle lane is always the bottom edge. The container transform maps that
//! frame onto the screen for the current orientation.

pub mod collision;
pub mod geometry;
pub mod level;
pub mod lifecycle;
pub mod orientation;
pub mod rotation;
pub mod schedule;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, ball_polyline_collision, ball_rect_collision};
pub use geometry::{EdgeLayout, PlayfieldGeometry, Rect, Segment};
pub use level::{BrickDescriptor, LevelGenerator, LevelLayout};
pub use lifecycle::start_new_game;
pub use orientation::{Orientation, PlayfieldTransform};
pub use rotation::{RotationState, request_rotation};
pub use schedule::{Scheduler, Task, TaskKey};
pub use state::{
    ActiveEffects, Ball, BallState, Brick, BrickKind, DropKind, FallingDrop, GamePhase, GameState,
    Paddle, RunState,
};
pub use tick::{CrownSample, TickInput, TouchSample, autopilot_target, run_frame, tick};
