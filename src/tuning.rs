//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads goes through [`Tuning`]. Defaults
//! come from [`crate::consts`]; a JSON file may override any subset of fields.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Grid placement of the block board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
    /// First grid row (in cells from the top of the playfield)
    pub start_row: usize,
    pub block_size: f32,
    /// Inclusive range of BallBonus blocks attempted per level
    pub min_bonus_blocks: u32,
    pub max_bonus_blocks: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            start_row: GRID_START_ROW,
            block_size: BLOCK_SIZE,
            min_bonus_blocks: 3,
            max_bonus_blocks: 5,
        }
    }
}

impl GridLayout {
    /// Top-left corner of a grid cell in playfield coordinates
    pub fn cell_origin(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(
            col as f32 * self.block_size,
            (self.start_row + row) as f32 * self.block_size,
        )
    }
}

/// Game balance knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub collection_line_y: f32,
    pub launch_origin: Vec2,

    // === Balls ===
    pub ball_radius: f32,
    /// Pixels per tick
    pub ball_speed: f32,
    pub starting_balls: u32,
    pub launch_interval_ticks: u32,
    pub aim_inset: f32,

    // === Board ===
    pub grid: GridLayout,

    // === Scoring ===
    pub normal_hit_score: u64,
    pub bonus_hit_score: u64,
    pub combo_banner_threshold: u32,

    // === Falling bonus ===
    pub bonus_spawn_delay_ticks: u64,
    pub bonus_fall_speed: f32,
    pub bonus_gravity: f32,

    // === Particles (cosmetic, 0 disables) ===
    pub particle_burst: usize,
    pub particle_gravity: f32,
    pub particle_decay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            collection_line_y: COLLECTION_LINE_Y,
            launch_origin: Vec2::new(LAUNCH_ORIGIN_X, LAUNCH_ORIGIN_Y),

            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            starting_balls: STARTING_BALLS,
            launch_interval_ticks: LAUNCH_INTERVAL_TICKS,
            aim_inset: AIM_INSET,

            grid: GridLayout::default(),

            normal_hit_score: NORMAL_HIT_SCORE,
            bonus_hit_score: BONUS_HIT_SCORE,
            combo_banner_threshold: COMBO_BANNER_THRESHOLD,

            bonus_spawn_delay_ticks: BONUS_SPAWN_DELAY_TICKS,
            bonus_fall_speed: BONUS_FALL_SPEED,
            bonus_gravity: BONUS_GRAVITY,

            particle_burst: PARTICLE_BURST,
            particle_gravity: PARTICLE_GRAVITY,
            particle_decay: PARTICLE_DECAY,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Widen a playfield too narrow to hold a ball
    pub fn sanitized(mut self) -> Self {
        self.ball_radius = self.ball_radius.max(0.0);
        let min_width = 2.0 * self.ball_radius;
        if !(self.canvas_width >= min_width) {
            log::warn!(
                "canvas_width {} cannot fit a ball of radius {}; using {}",
                self.canvas_width,
                self.ball_radius,
                min_width
            );
            self.canvas_width = min_width;
        }
        self
    }

    /// Serialize to pretty JSON (handy as a template for overrides)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Same tuning without particle bursts
    pub fn without_particles(mut self) -> Self {
        self.particle_burst = 0;
        self
    }
}
