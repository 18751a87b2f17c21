//! Collision detection and response
//!
//! Circle vs. rectangle (bricks, paddle) and circle vs. polyline (walls).
//! Restitution is always 1: a hit only changes direction.

use glam::Vec2;

use super::geometry::{Rect, Segment};

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the obstacle
    pub point: Vec2,
    /// Surface normal at collision (pointing toward ball center, for reflection)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a ball and an axis-aligned rectangle
pub fn ball_rect_collision(ball_pos: Vec2, ball_radius: f32, rect: &Rect) -> CollisionResult {
    let closest = rect.closest_point(ball_pos);
    let offset = ball_pos - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > 1e-8 {
        if dist_sq >= ball_radius * ball_radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            point: closest,
            normal: offset / dist,
            penetration: ball_radius - dist,
        };
    }

    // Center inside the rectangle (tunneling): push out along the shallowest axis
    let local = ball_pos - rect.center;
    let depth = rect.half - local.abs();
    let (normal, depth) = if depth.x < depth.y {
        (Vec2::new(local.x.signum(), 0.0), depth.x)
    } else {
        (Vec2::new(0.0, local.y.signum()), depth.y)
    };
    CollisionResult {
        hit: true,
        point: ball_pos - normal * depth,
        normal,
        penetration: depth + ball_radius,
    }
}

/// Check collision between a ball and one wall segment
pub fn ball_segment_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    segment: &Segment,
) -> CollisionResult {
    let closest = segment.closest_point(ball_pos);
    let offset = ball_pos - closest;
    let dist = offset.length();
    if dist >= ball_radius {
        return CollisionResult::miss();
    }

    let normal = if dist > 1e-4 {
        offset / dist
    } else {
        // Center on the line: use the segment's left-hand perpendicular
        let along = (segment.b - segment.a).normalize_or_zero();
        Vec2::new(-along.y, along.x)
    };
    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: ball_radius - dist,
    }
}

/// Deepest contact against a polyline
pub fn ball_polyline_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    segments: &[Segment],
) -> CollisionResult {
    segments
        .iter()
        .map(|s| ball_segment_collision(ball_pos, ball_radius, s))
        .filter(|c| c.hit)
        .max_by(|a, b| a.penetration.total_cmp(&b.penetration))
        .unwrap_or_else(CollisionResult::miss)
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect only if the ball is moving into the surface
#[inline]
pub fn bounce(velocity: Vec2, normal: Vec2) -> Vec2 {
    if velocity.dot(normal) < 0.0 {
        reflect_velocity(velocity, normal)
    } else {
        velocity
    }
}

/// Distance along +Y from `origin` to the bottom face of `rect`, if the
/// vertical ray passes through it
pub fn raycast_up(origin: Vec2, rect: &Rect) -> Option<f32> {
    let (min, max) = (rect.min(), rect.max());
    if origin.x < min.x || origin.x > max.x || max.y < origin.y {
        return None;
    }
    Some((min.y - origin.y).max(0.0))
}
