//! Circle vs. axis-aligned box collision
//!
//! Balls are circles, blocks are square grid cells. The reflection picks an axis
//! from the separation vector instead of computing a true contact normal; corner
//! hits can bounce a little oddly, which the gameplay has always had.

use glam::Vec2;

use super::state::{Ball, Block};

/// Result of a contact query
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the circle overlaps the box
    pub hit: bool,
    /// Closest point of the box to the circle centre
    pub point: Vec2,
    /// Circle centre minus closest point
    pub offset: Vec2,
    /// Length of `offset`
    pub distance: f32,
}

/// Closest-point contact between a circle and a block
pub fn block_contact(center: Vec2, radius: f32, block: &Block) -> CollisionResult {
    let point = center.clamp(block.pos, block.max());
    let offset = center - point;
    let distance = offset.length();
    CollisionResult {
        hit: distance < radius,
        point,
        offset,
        distance,
    }
}

/// Whether the ball currently overlaps the block
#[inline]
pub fn intersects_block(ball: &Ball, block: &Block) -> bool {
    block_contact(ball.pos, ball.radius, block).hit
}

/// Bounce the ball off the block and push it out of the overlap.
///
/// Flips `vx` when the horizontal separation strictly dominates, `vy` otherwise.
/// A ball whose centre is inside the box has zero separation and only gets the
/// velocity flip.
pub fn resolve_collision(ball: &mut Ball, block: &Block) {
    let contact = block_contact(ball.pos, ball.radius, block);

    if contact.offset.x.abs() > contact.offset.y.abs() {
        ball.vel.x = -ball.vel.x;
    } else {
        ball.vel.y = -ball.vel.y;
    }

    if contact.distance > 0.0 {
        let overlap = ball.radius - contact.distance;
        ball.pos += contact.offset / contact.distance * overlap;
    }
}
