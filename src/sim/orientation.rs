//! Playfield orientation
//!
//! The playfield-local frame never changes: the paddle lane is always its
//! bottom edge. The orientation says how the container is turned on screen,
//! i.e. which screen edge currently hosts the paddle.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::rotate_vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Bottom,
    Right,
    Top,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Bottom,
        Orientation::Right,
        Orientation::Top,
        Orientation::Left,
    ];

    pub fn index(self) -> i32 {
        match self {
            Orientation::Bottom => 0,
            Orientation::Right => 1,
            Orientation::Top => 2,
            Orientation::Left => 3,
        }
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    /// Container rotation on screen
    pub fn angle(self) -> f32 {
        match self {
            Orientation::Bottom => 0.0,
            Orientation::Right => FRAC_PI_2,
            Orientation::Top => PI,
            Orientation::Left => -FRAC_PI_2,
        }
    }

    /// Portrait orientations keep the scene's width/height; landscape ones swap them
    pub fn is_landscape(self) -> bool {
        matches!(self, Orientation::Right | Orientation::Left)
    }

    pub fn rotated(self, quarter_turns: i32) -> Self {
        Self::from_index(self.index() + quarter_turns)
    }

    /// Orientation after turning by `angle` (+90°, −90° or 180°)
    pub fn after_turn(self, angle: f32) -> Self {
        self.rotated(quarter_turns(angle))
    }

    /// Direction balls are lost toward, in world space
    pub fn world_down(self) -> Vec2 {
        rotate_vec(Vec2::NEG_Y, self.angle())
    }

    pub fn label(self) -> &'static str {
        match self {
            Orientation::Bottom => "bottom",
            Orientation::Right => "right",
            Orientation::Top => "top",
            Orientation::Left => "left",
        }
    }
}

/// Quarter turns for a rotation angle; anything near ±π is a half turn
pub fn quarter_turns(angle: f32) -> i32 {
    const TOLERANCE: f32 = 0.001;
    if (angle.abs() - PI).abs() < TOLERANCE {
        2
    } else if angle > 0.0 {
        1
    } else {
        -1
    }
}

/// Local <-> world mapping for the rotating container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayfieldTransform {
    pub angle: f32,
}

impl PlayfieldTransform {
    pub fn new(angle: f32) -> Self {
        Self { angle }
    }

    pub fn for_orientation(orientation: Orientation) -> Self {
        Self::new(orientation.angle())
    }

    /// Mid-sweep transform: `progress` in [0, 1] along an eased turn
    pub fn sweeping(from: Orientation, turn: f32, progress: f32) -> Self {
        Self::new(from.angle() + turn * crate::ease_in_out(progress))
    }

    pub fn to_world(&self, local: Vec2) -> Vec2 {
        rotate_vec(local, self.angle)
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        rotate_vec(world, -self.angle)
    }
}
