//! Round controller
//!
//! [`Game`] owns the live [`GameState`] and is the only thing allowed to replace it.
//! It takes the aim/launch commands from the input side and resolves each round
//! once the whole volley is back: board descent, game-over and stage-clear checks.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::level::generate_level;
use super::state::{Ball, GameEvent, GamePhase, GameState, Hud, LaunchSequence};
use crate::highscores::HighScores;
use crate::tuning::Tuning;
use crate::{aim_direction, angle_between, clamp_aim_angle};

/// PCG stream for cosmetic effects, kept apart from level generation
const FX_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;

/// The game session
#[derive(Debug, Clone)]
pub struct Game {
    pub(super) state: GameState,
    pub(super) tuning: Tuning,
    pub(super) high_scores: HighScores,
    /// Level layout randomness
    rng: Pcg32,
    /// Particle randomness
    pub(super) fx_rng: Pcg32,
    pub(super) events: Vec<GameEvent>,
    seed: u64,
}

impl Game {
    /// Create a game on the title screen. Call [`Game::start_session`] to play.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut game = Self {
            state: GameState::new(&tuning),
            tuning,
            high_scores: HighScores::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::new(seed, FX_STREAM),
            events: Vec::new(),
            seed,
        };
        game.state = game.fresh_state();
        game
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only snapshot for rendering
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn hud(&self) -> Hud {
        self.state.hud(&self.tuning)
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// New board, level 1, starting inventory
    fn fresh_state(&mut self) -> GameState {
        let mut state = GameState::new(&self.tuning);
        state.blocks = generate_level(&mut self.rng, &self.tuning.grid);
        state
    }

    fn begin_session(&mut self) {
        self.state = self.fresh_state();
        self.state.phase = GamePhase::Idle;
        self.events.push(GameEvent::SessionStarted);
    }

    pub fn start_session(&mut self) {
        self.begin_session();
        log::info!("Session started (seed {})", self.seed);
    }

    pub fn restart_session(&mut self) {
        self.begin_session();
        log::info!("Session restarted");
    }

    // --- Aiming -------------------------------------------------------------

    fn set_aim(&mut self, pointer: Vec2) {
        let angle = angle_between(self.state.launch_origin, pointer);
        self.state.aim_angle = clamp_aim_angle(angle, self.tuning.aim_inset);
    }

    /// Pointer pressed
    pub fn begin_aim(&mut self, pointer: Vec2) {
        if matches!(self.state.phase, GamePhase::Idle | GamePhase::Aiming) {
            self.state.phase = GamePhase::Aiming;
            self.set_aim(pointer);
        }
    }

    /// Pointer moved while held
    pub fn update_aim(&mut self, pointer: Vec2) {
        if self.state.phase == GamePhase::Aiming {
            self.set_aim(pointer);
        }
    }

    /// Pointer released: fire the volley
    pub fn release_aim(&mut self) {
        if self.state.phase == GamePhase::Aiming {
            self.launch();
        }
    }

    // --- Volley -------------------------------------------------------------

    fn launch(&mut self) {
        let state = &mut self.state;
        let interval = u64::from(self.tuning.launch_interval_ticks.max(1));

        state.phase = GamePhase::Shooting;
        state.balls_returned = 0;
        state.combo = 0;
        state.launch = Some(LaunchSequence {
            vel: aim_direction(state.aim_angle) * self.tuning.ball_speed,
            total: state.ball_count,
            launched: 0,
            next_launch_tick: state.time_ticks + interval,
        });

        log::debug!(
            "Launching {} balls at {:.1}°",
            state.ball_count,
            state.aim_angle.to_degrees()
        );
    }

    /// Release the next ball of the volley if it is due
    pub(super) fn advance_launch(&mut self) {
        let interval = u64::from(self.tuning.launch_interval_ticks.max(1));
        let now = self.state.time_ticks;

        let vel = match self.state.launch.as_mut() {
            Some(seq) if !seq.is_finished() && now >= seq.next_launch_tick => {
                seq.launched += 1;
                seq.next_launch_tick += interval;
                seq.vel
            }
            _ => return,
        };

        let id = self.state.next_entity_id();
        let origin = self.state.launch_origin;
        self.state
            .balls
            .push(Ball::new(id, origin, vel, self.tuning.ball_radius));
        self.events.push(GameEvent::BallLaunched { id });
    }

    /// Every ball of the volley has launched and come back
    pub fn round_complete(&self) -> bool {
        self.state.phase == GamePhase::Shooting
            && self
                .state
                .launch
                .as_ref()
                .is_some_and(|seq| seq.is_finished() && self.state.balls_returned >= seq.total)
    }

    // --- Resolution ---------------------------------------------------------

    /// Close the round: descend the board, then game over, stage clear, or next level
    pub(super) fn resolve_round(&mut self) {
        let line = self.tuning.collection_line_y;
        let state = &mut self.state;

        state.balls.clear();
        state.launch = None;
        for block in &mut state.blocks {
            block.move_down();
        }

        let (score, level) = (state.score, state.level);

        if state.blocks.iter().any(|b| b.is_alive() && b.pos.y >= line) {
            state.phase = GamePhase::GameOver;
            log::info!("Game over: score {} at level {}", score, level);
            self.high_scores.add_score(score, level);
            self.events.push(GameEvent::GameOver { score, level });
            return;
        }

        if !state.has_obstructions() {
            log::info!("Stage clear! score {}", score);
            self.high_scores.add_score(score, level);
            self.events.push(GameEvent::StageCleared { score });
            self.state = self.fresh_state();
            self.state.phase = GamePhase::Idle;
            return;
        }

        state.level += 1;
        state.blocks.retain(|b| b.survives_cleanup());
        state.phase = GamePhase::Idle;
        log::debug!(
            "Round resolved: level {}, {} blocks left, score {}",
            state.level,
            state.blocks.len(),
            state.score
        );
        self.events.push(GameEvent::RoundResolved { level: state.level });
    }
}
