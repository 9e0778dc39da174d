//! Spark Break - a Ballz-style block breaker
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, rounds, level layout)
//! - `tuning`: Data-driven game balance
//! - `highscores`: In-process leaderboard of finished runs
//!
//! Rendering, pointer input and menu chrome live outside this crate. They read
//! [`sim::GameState`] snapshots and feed commands into [`sim::Game`].

pub mod highscores;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions
    pub const CANVAS_WIDTH: f32 = 600.0;
    pub const CANVAS_HEIGHT: f32 = 800.0;
    /// Balls, bonuses and blocks are consumed at this y
    pub const COLLECTION_LINE_Y: f32 = 480.0;
    /// Turret rest position (inside the staging area)
    pub const LAUNCH_ORIGIN_X: f32 = CANVAS_WIDTH / 2.0;
    pub const LAUNCH_ORIGIN_Y: f32 = 750.0;

    /// Ball defaults (speeds are pixels per tick)
    pub const BALL_RADIUS: f32 = 6.0;
    pub const BALL_SPEED: f32 = 12.0;
    pub const STARTING_BALLS: u32 = 1;
    /// 50 ms between balls of one volley
    pub const LAUNCH_INTERVAL_TICKS: u32 = 3;

    /// Block grid
    pub const BLOCK_SIZE: f32 = 10.0;
    pub const GRID_COLS: usize = 60;
    pub const GRID_ROWS: usize = 24;
    pub const GRID_START_ROW: usize = 16;
    pub const WALL_HP: i32 = 999_999;

    /// Scoring
    pub const NORMAL_HIT_SCORE: u64 = 10;
    pub const BONUS_HIT_SCORE: u64 = 100;
    /// Combo above this shows the banner
    pub const COMBO_BANNER_THRESHOLD: u32 = 5;

    /// Falling bonus ball
    pub const BONUS_SPAWN_DELAY_TICKS: u64 = 6;
    pub const BONUS_FALL_SPEED: f32 = 2.0;
    pub const BONUS_GRAVITY: f32 = 0.2;

    /// Particles (cosmetic)
    pub const PARTICLE_GRAVITY: f32 = 0.3;
    pub const PARTICLE_DECAY: f32 = 0.02;
    pub const PARTICLE_BURST: usize = 8;

    /// Aim is kept this far off horizontal
    pub const AIM_INSET: f32 = 0.1;
}

/// Angle from `from` toward `to`, screen coordinates (y down)
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Keep an aim angle in the upward half-plane.
///
/// Angles inside `[-π, 0]` pass untouched, endpoints included. Any downward angle
/// snaps to `-inset`; anything past `-π` snaps to `-π + inset`.
#[inline]
pub fn clamp_aim_angle(angle: f32, inset: f32) -> f32 {
    use std::f32::consts::PI;

    if angle > 0.0 {
        -inset
    } else if angle < -PI {
        -PI + inset
    } else {
        angle
    }
}

/// Unit direction for an aim angle
#[inline]
pub fn aim_direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_angle_between_straight_up() {
        let a = angle_between(Vec2::new(300.0, 750.0), Vec2::new(300.0, 100.0));
        assert!((a + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_aim_angle() {
        // In range, untouched
        assert_eq!(clamp_aim_angle(-1.0, 0.1), -1.0);
        assert_eq!(clamp_aim_angle(0.0, 0.1), 0.0);
        assert_eq!(clamp_aim_angle(-PI, 0.1), -PI);

        // Every downward angle goes to the right-hand bound, left side included
        for a in [0.3, 1.0, 2.0, 3.0, PI] {
            assert!((clamp_aim_angle(a, 0.1) + 0.1).abs() < 1e-6, "angle {a}");
        }
        // Past -π

        assert!((clamp_aim_angle(-4.0, 0.1) - (-PI + 0.1)).abs() < 1e-6);
    }
}
