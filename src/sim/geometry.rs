//! Playfield geometry in the local frame
//!
//! Rectangles for bricks, paddle and bounds, the paddle lane segment, and the
//! rounded boundary polyline. All of it is derived from the scene size and
//! the current orientation, never mutated in place.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::orientation::Orientation;
use crate::config::GameConfig;
use crate::consts::CORNER_SEGMENTS;

/// Axis-aligned rectangle stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub half: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self {
            center,
            half: half.abs(),
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min + size / 2.0, size / 2.0)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    pub fn width(&self) -> f32 {
        self.half.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half.y * 2.0
    }

    /// Zero-area rects short-circuit every layout function
    pub fn is_degenerate(&self) -> bool {
        self.half.x <= 0.0 || self.half.y <= 0.0
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        let d = (other.center - self.center).abs();
        d.x <= self.half.x + other.half.x && d.y <= self.half.y + other.half.y
    }

    /// Shrink on every side (negative grows); never below zero size
    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(self.center, (self.half - Vec2::splat(amount)).max(Vec2::ZERO))
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// A straight wall piece of the boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq < 1e-8 {
            return self.a;
        }
        let t = ((p - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.a + ab * t
    }
}

/// The line the paddle slides along
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeLayout {
    pub start: Vec2,
    pub end: Vec2,
}

impl EdgeLayout {
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.start.lerp(self.end, t.clamp(0.0, 1.0))
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Normalized projection of `p` onto the edge, or `None` for a zero-length edge
    pub fn project(&self, p: Vec2) -> Option<f32> {
        let d = self.end - self.start;
        let len_sq = d.length_squared();
        if len_sq <= 0.0 {
            return None;
        }
        Some(((p - self.start).dot(d) / len_sq).clamp(0.0, 1.0))
    }
}

/// Everything derived from scene size + orientation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayfieldGeometry {
    pub scene_size: Vec2,
    pub orientation: Orientation,
    pub bounds: Rect,
    pub lane: EdgeLayout,
    pub boundary: Vec<Segment>,
}

impl PlayfieldGeometry {
    pub fn new(config: &GameConfig, scene_size: Vec2, orientation: Orientation) -> Self {
        let bounds = playfield_bounds(config, scene_size, orientation);
        Self {
            scene_size,
            orientation,
            bounds,
            lane: paddle_lane(config, &bounds),
            boundary: boundary_polyline(&bounds, config.boundary_corner_radius),
        }
    }

    /// Bounds the level layout is authored against (always portrait)
    pub fn portrait_bounds(&self, config: &GameConfig) -> Rect {
        playfield_bounds(config, self.scene_size, Orientation::Bottom)
    }

    /// How far `p` sits below the lane-side edge (positive = outside)
    pub fn exit_depth(&self, p: Vec2) -> f32 {
        self.bounds.min().y - p.y
    }
}

/// Local playfield rectangle, centered on the origin. Landscape orientations
/// swap width and height so the turned container still fits the screen.
pub fn playfield_bounds(config: &GameConfig, scene_size: Vec2, orientation: Orientation) -> Rect {
    let inset = config.playfield_inset;
    let size = if orientation.is_landscape() {
        Vec2::new(scene_size.y, scene_size.x)
    } else {
        scene_size
    };
    let inner = (size - Vec2::splat(inset * 2.0)).max(Vec2::ZERO);
    Rect::new(Vec2::ZERO, inner / 2.0)
}

pub fn paddle_lane(config: &GameConfig, bounds: &Rect) -> EdgeLayout {
    let y = bounds.min().y + config.paddle_lane_inset;
    let edge = config.paddle_edge_inset;
    EdgeLayout {
        start: Vec2::new(bounds.min().x + edge, y),
        end: Vec2::new(bounds.max().x - edge, y),
    }
}

/// Left wall, rounded top-left corner, ceiling, rounded top-right corner,
/// right wall. Open across the paddle lane so balls can leave.
pub fn boundary_polyline(bounds: &Rect, corner_radius: f32) -> Vec<Segment> {
    if bounds.is_degenerate() {
        return Vec::new();
    }

    let (min, max) = (bounds.min(), bounds.max());
    let corner = corner_radius.min(bounds.half.x).min(bounds.half.y).max(0.0);

    let mut points = vec![Vec2::new(min.x, min.y), Vec2::new(min.x, max.y - corner)];
    push_quad_corner(
        &mut points,
        Vec2::new(min.x, max.y - corner),
        Vec2::new(min.x, max.y),
        Vec2::new(min.x + corner, max.y),
    );
    points.push(Vec2::new(max.x - corner, max.y));
    push_quad_corner(
        &mut points,
        Vec2::new(max.x - corner, max.y),
        Vec2::new(max.x, max.y),
        Vec2::new(max.x, max.y - corner),
    );
    points.push(Vec2::new(max.x, min.y));

    points.dedup_by(|a, b| a.distance_squared(*b) < 1e-6);
    points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .collect()
}

/// Quadratic Bézier from `from` to `to` around `control`, excluding `from`
fn push_quad_corner(points: &mut Vec<Vec2>, from: Vec2, control: Vec2, to: Vec2) {
    for i in 1..=CORNER_SEGMENTS {
        let t = i as f32 / CORNER_SEGMENTS as f32;
        let u = 1.0 - t;
        points.push(from * (u * u) + control * (2.0 * u * t) + to * (t * t));
    }
}
