//! Game state and core simulation types
//!
//! Everything the presentation layer draws lives here. All of it is plain data and
//! serializable, so a frame snapshot is just `serde_json::to_string(&state)`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::WALL_HP;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Session not started yet
    Title,
    /// Turret at rest, waiting for the player to aim
    Idle,
    /// Pointer held, aim angle tracking the pointer
    Aiming,
    /// Volley in flight
    Shooting,
    /// A block reached the collection line
    GameOver,
}

impl GamePhase {
    /// Whether the simulation advances in this phase
    pub fn is_running(self) -> bool {
        matches!(self, GamePhase::Idle | GamePhase::Aiming | GamePhase::Shooting)
    }
}

/// A ball in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub active: bool,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            active: true,
        }
    }

    /// Integrate one tick and bounce off the side walls and ceiling.
    ///
    /// The side test fires whenever the ball touches a side, whichever way it moves.
    pub fn advance(&mut self, width: f32) {
        self.pos += self.vel;

        if self.pos.x - self.radius <= 0.0 || self.pos.x + self.radius >= width {
            self.vel.x = -self.vel.x;
            self.pos.x = self.pos.x.min(width - self.radius).max(self.radius);
        }

        if self.pos.y - self.radius <= 0.0 {
            self.vel.y = -self.vel.y;
            self.pos.y = self.radius;
        }
    }

    /// Ball is back in the staging area. The launch origin sits below the line,
    /// so a ball still climbing out of it does not count; a flat shot does.
    pub fn has_returned(&self, collection_line_y: f32) -> bool {
        self.pos.y >= collection_line_y && self.vel.y >= 0.0
    }
}

/// Block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Normal,
    /// Indestructible, only reflects
    Wall,
    /// Breaks on the first hit and drops an extra ball
    BallBonus,
}

/// One grid cell of the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    pub kind: BlockKind,
    pub hp: i32,
    pub max_hp: i32,
}

impl Block {
    pub fn normal(pos: Vec2, size: f32, hp: i32) -> Self {
        Self {
            pos,
            size,
            kind: BlockKind::Normal,
            hp,
            max_hp: hp,
        }
    }

    pub fn wall(pos: Vec2, size: f32) -> Self {
        Self {
            pos,
            size,
            kind: BlockKind::Wall,
            hp: WALL_HP,
            max_hp: WALL_HP,
        }
    }

    pub fn ball_bonus(pos: Vec2, size: f32) -> Self {
        Self {
            pos,
            size,
            kind: BlockKind::BallBonus,
            hp: 1,
            max_hp: 1,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_wall(&self) -> bool {
        self.kind == BlockKind::Wall
    }

    /// Bottom-right corner
    pub fn max(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    /// Shift down one cell
    pub fn move_down(&mut self) {
        self.pos.y += self.size;
    }

    /// Remaining health in 0..=1 for shading Normal blocks
    pub fn health_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp.max(0) as f32 / self.max_hp as f32).min(1.0)
    }

    /// Survives round cleanup
    pub fn survives_cleanup(&self) -> bool {
        self.is_wall() || self.is_alive()
    }
}

/// An extra ball dropping toward the staging area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingBonus {
    pub pos: Vec2,
    pub vel_y: f32,
    pub collected: bool,
}

impl FallingBonus {
    pub fn new(pos: Vec2, fall_speed: f32) -> Self {
        Self {
            pos,
            vel_y: fall_speed,
            collected: false,
        }
    }

    /// Fall one tick. Returns true on the tick it gets collected.
    pub fn fall(&mut self, gravity: f32, collection_line_y: f32) -> bool {
        if self.collected {
            return false;
        }
        self.pos.y += self.vel_y;
        self.vel_y += gravity;
        if self.pos.y >= collection_line_y {
            self.collected = true;
            return true;
        }
        false
    }
}

/// A bonus drop waiting for its spawn tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBonus {
    pub pos: Vec2,
    pub spawn_tick: u64,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: BlockKind, // For color lookup
    pub life: f32,       // 0-1, decreases over time
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self, gravity: f32, decay: f32) {
        self.pos += self.vel;
        self.vel.y += gravity;
        self.life -= decay;
    }
}

/// Maximum particles
pub const MAX_PARTICLES: usize = 256;

/// Staggered release of one volley
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSequence {
    pub vel: Vec2,
    /// Balls this volley releases (inventory at the moment of launch)
    pub total: u32,
    pub launched: u32,
    /// Tick on which the next ball appears
    pub next_launch_tick: u64,
}

impl LaunchSequence {
    pub fn is_finished(&self) -> bool {
        self.launched >= self.total
    }
}

/// Things that happened during a tick, for sound/UI hooks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    BallLaunched { id: u32 },
    BallReturned { id: u32, x: f32 },
    BlockHit { kind: BlockKind, pos: Vec2 },
    BlockDestroyed { kind: BlockKind, pos: Vec2 },
    BonusCollected { ball_count: u32 },
    RoundResolved { level: u32 },
    StageCleared { score: u64 },
    GameOver { score: u64, level: u32 },
}

/// Per-tick readout for the score/level/ball-count chrome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub level: u32,
    pub ball_count: u32,
    pub score: u64,
    pub combo: u32,
    /// Combo above the banner threshold
    pub combo_banner: bool,
    pub game_over: bool,
}

/// Complete round state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Stage level counter (1-based)
    pub level: u32,
    pub score: u64,
    /// Balls the next volley will launch
    pub ball_count: u32,
    pub phase: GamePhase,
    /// Radians, screen coordinates (negative is up)
    pub aim_angle: f32,
    /// Where the next volley starts; x follows the first returned ball
    pub launch_origin: Vec2,
    pub balls_returned: u32,
    pub combo: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Active volley, if shooting
    pub launch: Option<LaunchSequence>,
    /// Active balls (sorted by id)
    pub balls: Vec<Ball>,
    /// Board, in generation order
    pub blocks: Vec<Block>,
    pub falling_bonuses: Vec<FallingBonus>,
    pub pending_bonuses: Vec<PendingBonus>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Fresh state with an empty board
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            level: 1,
            score: 0,
            ball_count: tuning.starting_balls.max(1),
            phase: GamePhase::Title,
            aim_angle: -std::f32::consts::FRAC_PI_4,
            launch_origin: tuning.launch_origin,
            balls_returned: 0,
            combo: 0,
            time_ticks: 0,
            launch: None,
            balls: Vec::new(),
            blocks: Vec::new(),
            falling_bonuses: Vec::new(),
            pending_bonuses: Vec::new(),
            particles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Blocks that still stand between the player and a stage clear
    pub fn has_obstructions(&self) -> bool {
        self.blocks.iter().any(|b| match b.kind {
            BlockKind::Wall => true,
            BlockKind::BallBonus | BlockKind::Normal => b.is_alive(),
        })
    }

    pub fn hud(&self, tuning: &Tuning) -> Hud {
        Hud {
            level: self.level,
            ball_count: self.ball_count,
            score: self.score,
            combo: self.combo,
            combo_banner: self.combo > tuning.combo_banner_threshold,
            game_over: self.phase == GamePhase::GameOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ball_bounces_off_left_wall() {
        let mut ball = Ball::new(1, Vec2::new(8.0, 300.0), Vec2::new(-5.0, -3.0), 6.0);
        ball.advance(600.0);
        assert_eq!(ball.vel.x, 5.0);
        assert_eq!(ball.pos.x, 6.0);
        assert_eq!(ball.pos.y, 297.0);
    }

    #[test]
    fn test_ball_in_too_narrow_field_does_not_panic() {
        let mut ball = Ball::new(1, Vec2::new(4.0, 300.0), Vec2::new(1.0, -3.0), 6.0);
        ball.advance(5.0);
        assert_eq!(ball.vel.x, -1.0);
        assert_eq!(ball.pos.x, 6.0);
    }

    #[test]
    fn test_ball_bounces_off_ceiling() {
        let mut ball = Ball::new(1, Vec2::new(100.0, 8.0), Vec2::new(3.0, -5.0), 6.0);
        ball.advance(600.0);
        assert_eq!(ball.vel.y, 5.0);
        assert_eq!(ball.pos.y, 6.0);
    }

    #[test]
    fn test_ball_return_needs_downward_motion() {
        let rising = Ball::new(1, Vec2::new(300.0, 700.0), Vec2::new(0.0, -12.0), 6.0);
        assert!(!rising.has_returned(480.0));

        let falling = Ball::new(2, Vec2::new(300.0, 483.0), Vec2::new(0.0, 5.0), 6.0);
        assert!(falling.has_returned(480.0));

        let flat = Ball::new(3, Vec2::new(300.0, 750.0), Vec2::new(12.0, 0.0), 6.0);
        assert!(flat.has_returned(480.0));
    }

    #[test]
    fn test_falling_bonus_collected_at_line() {
        let mut bonus = FallingBonus::new(Vec2::new(100.0, 470.0), 2.0);
        assert!(!bonus.fall(0.2, 480.0)); // 472
        assert!(!bonus.fall(0.2, 480.0)); // 474.2
        assert!(!bonus.fall(0.2, 480.0)); // 476.6
        assert!(!bonus.fall(0.2, 480.0)); // 479.2
        assert!(bonus.fall(0.2, 480.0)); // 482.0
        assert!(bonus.collected);
        // Only reported once
        assert!(!bonus.fall(0.2, 480.0));
    }

    #[test]
    fn test_particle_decays() {
        let mut p = Particle {
            pos: Vec2::ZERO,
            vel: Vec2::new(1.0, 0.0),
            kind: BlockKind::Normal,
            life: 0.05,
            size: 3.0,
        };
        p.update(0.3, 0.02);
        p.update(0.3, 0.02);
        assert!(p.life > 0.0);
        p.update(0.3, 0.02);
        assert!(p.life <= 0.0);
        assert!((p.vel.y - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_block_helpers() {
        let mut block = Block::normal(Vec2::new(50.0, 200.0), 10.0, 3);
        assert_eq!(block.center(), Vec2::new(55.0, 205.0));
        block.hp = 1;
        assert!((block.health_fraction() - 1.0 / 3.0).abs() < 1e-6);
        block.move_down();
        assert_eq!(block.pos.y, 210.0);

        block.hp = 0;
        assert!(!block.survives_cleanup());
        let wall = Block::wall(Vec2::ZERO, 10.0);
        assert!(wall.survives_cleanup());
    }

    #[test]
    fn test_obstructions() {
        let tuning = Tuning::default();
        let mut state = GameState::new(&tuning);
        assert!(!state.has_obstructions());

        let mut dead = Block::normal(Vec2::ZERO, 10.0, 1);
        dead.hp = 0;
        state.blocks.push(dead);
        assert!(!state.has_obstructions());

        state.blocks.push(Block::wall(Vec2::ZERO, 10.0));
        assert!(state.has_obstructions());
    }

    proptest! {
        #[test]
        fn speed_is_preserved_by_boundary_bounces(
            x in 10.0f32..590.0,
            y in 10.0f32..470.0,
            angle in -3.1f32..-0.05,
            steps in 1usize..400,
        ) {
            let vel = Vec2::new(angle.cos(), angle.sin()) * 12.0;
            let mut ball = Ball::new(1, Vec2::new(x, y), vel, 6.0);
            let speed = ball.vel.length();
            for _ in 0..steps {
                ball.advance(600.0);
            }
            prop_assert!((ball.vel.length() - speed).abs() < 1e-3);
        }
    }
}
