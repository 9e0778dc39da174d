//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (balls by launch, blocks by board position)
//! - No rendering or platform dependencies

pub mod collision;
pub mod level;
pub mod round;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, block_contact, intersects_block, resolve_collision};
pub use level::{generate_level, wall_cells};
pub use round::Game;
pub use state::{
    Ball, Block, BlockKind, FallingBonus, GameEvent, GamePhase, GameState, Hud, LaunchSequence,
    MAX_PARTICLES, Particle, PendingBonus,
};
pub use tick::{FixedStep, TickInput, tick};
