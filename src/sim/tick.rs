//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session deterministically: input commands,
//! ball flight and block hits, falling bonuses, particles, then round bookkeeping.

use glam::Vec2;
use rand::Rng;

use super::collision::{intersects_block, resolve_collision};
use super::round::Game;
use super::state::{BlockKind, FallingBonus, GameEvent, MAX_PARTICLES, Particle, PendingBonus};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in playfield coordinates
    pub pointer: Option<Vec2>,
    /// Pointer went down this tick
    pub press: bool,
    /// Pointer went up this tick
    pub release: bool,
}

impl TickInput {
    /// Fold a later frame's input into this one without losing one-shot edges
    pub fn merge(&mut self, later: &TickInput) {
        if later.pointer.is_some() {
            self.pointer = later.pointer;
        }
        self.press |= later.press;
        self.release |= later.release;
    }
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput) {
    // Nothing moves before the session starts or after it ends
    if !game.state.phase.is_running() {
        return;
    }

    game.state.time_ticks += 1;

    apply_input(game, input);
    step_balls(game);
    step_falling_bonuses(game);
    step_particles(game);
    spawn_due_bonuses(game);
    game.advance_launch();

    if game.round_complete() {
        game.resolve_round();
    }
}

fn apply_input(game: &mut Game, input: &TickInput) {
    if input.press {
        if let Some(pointer) = input.pointer {
            game.begin_aim(pointer);
        }
    } else if let Some(pointer) = input.pointer {
        game.update_aim(pointer);
    }

    if input.release {
        game.release_aim();
    }
}

/// Move every ball, bounce it off the board, count the ones coming home.
///
/// Balls go in launch order and blocks in board order, so a seed replays exactly.
fn step_balls(game: &mut Game) {
    let Game {
        state,
        tuning,
        fx_rng,
        events,
        ..
    } = game;
    let line = tuning.collection_line_y;

    for ball in state.balls.iter_mut().filter(|b| b.active) {
        ball.advance(tuning.canvas_width);

        if ball.has_returned(line) {
            ball.active = false;
            state.balls_returned += 1;
            state.launch_origin.x = ball.pos.x;
            events.push(GameEvent::BallReturned {
                id: ball.id,
                x: ball.pos.x,
            });
            continue;
        }

        for block in state.blocks.iter_mut() {
            if !block.is_alive() || !intersects_block(ball, block) {
                continue;
            }

            match block.kind {
                BlockKind::Wall => {}
                BlockKind::BallBonus => {
                    block.hp = 0;
                    state.score += tuning.bonus_hit_score;
                    state.combo += 1;
                    state.pending_bonuses.push(PendingBonus {
                        pos: block.center(),
                        spawn_tick: state.time_ticks + tuning.bonus_spawn_delay_ticks,
                    });
                }
                BlockKind::Normal => {
                    block.hp -= 1;
                    state.score += tuning.normal_hit_score;
                    if block.hp > 0 {
                        state.combo += 1;
                    }
                }
            }

            if !block.is_wall() {
                events.push(GameEvent::BlockHit {
                    kind: block.kind,
                    pos: block.pos,
                });
                if !block.is_alive() {
                    events.push(GameEvent::BlockDestroyed {
                        kind: block.kind,
                        pos: block.pos,
                    });
                    spawn_burst(
                        &mut state.particles,
                        &mut *fx_rng,
                        block.center(),
                        block.kind,
                        tuning.particle_burst,
                    );
                }
            }

            resolve_collision(ball, block);
        }
    }

    state.balls.retain(|b| b.active);
}

fn step_falling_bonuses(game: &mut Game) {
    let state = &mut game.state;
    let line = game.tuning.collection_line_y;

    for bonus in &mut state.falling_bonuses {
        if bonus.fall(game.tuning.bonus_gravity, line) {
            state.ball_count += 1;
            game.events.push(GameEvent::BonusCollected {
                ball_count: state.ball_count,
            });
        }
    }
    state.falling_bonuses.retain(|b| !b.collected);
}

fn step_particles(game: &mut Game) {
    let (gravity, decay) = (game.tuning.particle_gravity, game.tuning.particle_decay);
    for particle in game.state.particles.iter_mut() {
        particle.update(gravity, decay);
    }
    game.state.particles.retain(|p| p.life > 0.0);
}

/// Turn queued bonus drops into falling bonuses once their tick comes up
fn spawn_due_bonuses(game: &mut Game) {
    let state = &mut game.state;
    let now = state.time_ticks;
    let fall_speed = game.tuning.bonus_fall_speed;

    let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pending_bonuses)
        .into_iter()
        .partition(|p| p.spawn_tick <= now);
    state.pending_bonuses = waiting;
    state
        .falling_bonuses
        .extend(due.into_iter().map(|p| FallingBonus::new(p.pos, fall_speed)));
}

/// Spray of debris from a destroyed block
fn spawn_burst<R: Rng>(
    particles: &mut Vec<Particle>,
    rng: &mut R,
    center: Vec2,
    kind: BlockKind,
    count: usize,
) {
    let count = count.min(MAX_PARTICLES.saturating_sub(particles.len()));
    for _ in 0..count {
        particles.push(Particle {
            pos: center,
            vel: Vec2::new(
                (rng.random::<f32>() - 0.5) * 8.0,
                (rng.random::<f32>() - 0.5) * 8.0,
            ),
            kind,
            life: 1.0,
            size: rng.random::<f32>() * 4.0 + 2.0,
        });
    }
}

/// Wall-clock to fixed-step adapter
///
/// Accumulates frame time and runs whole ticks. One-shot input edges are held
/// until a tick actually consumes them.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
    input: TickInput,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue input for the next tick
    pub fn queue(&mut self, input: &TickInput) {
        self.input.merge(input);
    }

    /// Run as many ticks as `frame_dt` covers. Returns the number of ticks run.
    pub fn advance(&mut self, game: &mut Game, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, 0.1)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(game, &self.input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.press = false;
            self.input.release = false;
        }

        // Drop backlog we refused to simulate
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Ball, Block, GamePhase};
    use crate::tuning::Tuning;

    fn started(tuning: Tuning) -> Game {
        let mut game = Game::new(12345, tuning);
        game.start_session();
        game.drain_events();
        game
    }

    fn lone_block(game: &mut Game, block: Block) {
        game.state_mut().blocks = vec![block];
    }

    fn push_ball(game: &mut Game, pos: Vec2, vel: Vec2) {
        let state = game.state_mut();
        let id = state.next_entity_id();
        state.balls.push(Ball::new(id, pos, vel, 6.0));
    }

    #[test]
    fn test_ball_reaching_collection_line_returns() {
        let mut game = started(Tuning::default());
        lone_block(&mut game, Block::wall(Vec2::new(0.0, 0.0), 10.0));
        push_ball(&mut game, Vec2::new(100.0, 478.0), Vec2::new(0.0, 5.0));

        tick(&mut game, &TickInput::default());

        let state = game.state();
        assert!(state.balls.is_empty());
        assert_eq!(state.balls_returned, 1);
        assert_eq!(state.launch_origin.x, 100.0);
        assert!(
            game.drain_events()
                .contains(&GameEvent::BallReturned { id: 1, x: 100.0 })
        );
    }

    #[test]
    fn test_normal_block_two_hits() {
        let mut game = started(Tuning::default());
        lone_block(&mut game, Block::normal(Vec2::new(100.0, 200.0), 10.0, 2));

        // Hit from below: lands at y=214, 4 px under the block
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));
        tick(&mut game, &TickInput::default());
        {
            let state = game.state();
            assert_eq!(state.blocks[0].hp, 1);
            assert_eq!(state.score, 10);
            assert_eq!(state.combo, 1);
            assert_eq!(state.balls[0].vel, Vec2::new(0.0, 12.0));
        }

        game.state_mut().balls.clear();
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));
        tick(&mut game, &TickInput::default());
        {
            let state = game.state();
            assert_eq!(state.blocks[0].hp, 0);
            assert_eq!(state.score, 20);
            assert_eq!(state.combo, 1);
        }
        assert!(game.drain_events().contains(&GameEvent::BlockDestroyed {
            kind: BlockKind::Normal,
            pos: Vec2::new(100.0, 200.0),
        }));

        // Dead blocks no longer collide
        game.state_mut().balls.clear();
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));
        tick(&mut game, &TickInput::default());
        assert_eq!(game.state().score, 20);
        assert_eq!(game.state().balls[0].vel, Vec2::new(0.0, -12.0));
    }

    #[test]
    fn test_wall_reflects_without_scoring() {
        let mut game = started(Tuning::default());
        lone_block(&mut game, Block::wall(Vec2::new(100.0, 200.0), 10.0));
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));

        tick(&mut game, &TickInput::default());

        let state = game.state();
        assert_eq!(state.blocks[0].hp, crate::consts::WALL_HP);
        assert_eq!(state.score, 0);
        assert_eq!(state.combo, 0);
        assert_eq!(state.balls[0].vel, Vec2::new(0.0, 12.0));
    }

    #[test]
    fn test_ball_bonus_drops_extra_ball() {
        let tuning = Tuning::default();
        let delay = tuning.bonus_spawn_delay_ticks;
        let mut game = started(tuning);
        lone_block(&mut game, Block::ball_bonus(Vec2::new(100.0, 200.0), 10.0));
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));

        tick(&mut game, &TickInput::default());
        let hit_tick = game.state().time_ticks;
        {
            let state = game.state();
            assert_eq!(state.blocks[0].hp, 0);
            assert_eq!(state.score, 100);
            assert_eq!(state.combo, 1);
            assert_eq!(state.pending_bonuses.len(), 1);
            assert!(state.falling_bonuses.is_empty());
        }

        // Keep the ball out of the way
        game.state_mut().balls.clear();

        while game.state().time_ticks < hit_tick + delay - 1 {
            tick(&mut game, &TickInput::default());
            assert!(game.state().falling_bonuses.is_empty());
        }
        tick(&mut game, &TickInput::default());
        {
            let state = game.state();
            assert!(state.pending_bonuses.is_empty());
            assert_eq!(state.falling_bonuses.len(), 1);
            assert_eq!(state.falling_bonuses[0].pos, Vec2::new(105.0, 205.0));
        }

        let before = game.state().ball_count;
        for _ in 0..200 {
            tick(&mut game, &TickInput::default());
        }
        assert_eq!(game.state().ball_count, before + 1);
        assert!(game.state().falling_bonuses.is_empty());
        let collected = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BonusCollected { .. }))
            .count();
        assert_eq!(collected, 1);
    }

    #[test]
    fn test_particles_are_cosmetic() {
        let run = |tuning: Tuning| {
            let mut game = started(tuning);
            lone_block(&mut game, Block::normal(Vec2::new(100.0, 200.0), 10.0, 1));
            push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));
            tick(&mut game, &TickInput::default());
            let particles = game.state().particles.len();
            (particles, game.state().score, game.state().blocks[0].hp)
        };

        let (with_fx, score_a, hp_a) = run(Tuning::default());
        let (without_fx, score_b, hp_b) = run(Tuning::default().without_particles());
        assert_eq!(with_fx, crate::consts::PARTICLE_BURST);
        assert_eq!(without_fx, 0);
        assert_eq!((score_a, hp_a), (score_b, hp_b));
    }

    #[test]
    fn test_particles_expire() {
        let mut game = started(Tuning::default());
        lone_block(&mut game, Block::normal(Vec2::new(100.0, 200.0), 10.0, 1));
        push_ball(&mut game, Vec2::new(105.0, 226.0), Vec2::new(0.0, -12.0));
        tick(&mut game, &TickInput::default());
        assert!(!game.state().particles.is_empty());

        for _ in 0..60 {
            tick(&mut game, &TickInput::default());
        }
        assert!(game.state().particles.is_empty());
    }

    #[test]
    fn test_tick_input_drives_a_volley() {
        let mut game = started(Tuning::default());
        let origin = game.state().launch_origin;

        let press = TickInput {
            pointer: Some(origin + Vec2::new(0.0, -200.0)),
            press: true,
            release: false,
        };
        tick(&mut game, &press);
        assert_eq!(game.state().phase, GamePhase::Aiming);

        let release = TickInput {
            release: true,
            ..Default::default()
        };
        tick(&mut game, &release);
        assert_eq!(game.state().phase, GamePhase::Shooting);

        for _ in 0..3 {
            tick(&mut game, &TickInput::default());
        }
        assert_eq!(game.state().balls.len(), 1);
        assert!(game.state().balls[0].vel.y < 0.0);
    }

    #[test]
    fn test_game_over_freezes_simulation() {
        let mut game = started(Tuning::default());
        push_ball(&mut game, Vec2::new(100.0, 300.0), Vec2::new(0.0, -5.0));
        game.state_mut().phase = GamePhase::GameOver;
        let before = game.state().time_ticks;

        let input = TickInput {
            pointer: Some(Vec2::new(300.0, 100.0)),
            press: true,
            release: true,
        };
        tick(&mut game, &input);

        let state = game.state();
        assert_eq!(state.time_ticks, before);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.balls[0].pos, Vec2::new(100.0, 300.0));
    }

    #[test]
    fn test_same_seed_same_run() {
        let play = || {
            let mut game = started(Tuning::default());
            let origin = game.state().launch_origin;
            let mut steps = FixedStep::new();
            steps.queue(&TickInput {
                pointer: Some(origin + Vec2::new(-40.0, -300.0)),
                press: true,
                release: true,
            });
            for _ in 0..600 {
                steps.advance(&mut game, SIM_DT);
            }
            (
                game.state().score,
                game.state().level,
                game.state().time_ticks,
                game.state().blocks.iter().map(|b| b.hp).sum::<i32>(),
            )
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_fixed_step_caps_substeps() {
        let mut game = started(Tuning::default());
        let mut steps = FixedStep::new();
        assert_eq!(steps.advance(&mut game, 0.0), 0);
        // 0.1 s clamp covers 6 ticks at 60 Hz
        let ran = steps.advance(&mut game, 5.0);
        assert!(ran >= 5 && ran <= MAX_SUBSTEPS);
        assert_eq!(game.state().time_ticks, u64::from(ran));
    }

    #[test]
    fn test_fixed_step_ignores_non_finite_frames() {
        let mut game = started(Tuning::default());
        let mut steps = FixedStep::new();
        assert_eq!(steps.advance(&mut game, f32::NAN), 0);
        assert_eq!(steps.advance(&mut game, f32::INFINITY), 0);
        // Clock still runs afterwards
        assert_eq!(steps.advance(&mut game, SIM_DT * 1.5), 1);
        assert_eq!(game.state().time_ticks, 1);
    }

    #[test]
    fn test_fixed_step_holds_edges_until_consumed() {
        let mut game = started(Tuning::default());
        let origin = game.state().launch_origin;
        let mut steps = FixedStep::new();

        steps.queue(&TickInput {
            pointer: Some(origin + Vec2::new(0.0, -100.0)),
            press: true,
            release: false,
        });
        // Too short for a tick: the press must survive
        assert_eq!(steps.advance(&mut game, SIM_DT * 0.25), 0);
        assert_eq!(game.state().phase, GamePhase::Idle);

        steps.advance(&mut game, SIM_DT);
        assert_eq!(game.state().phase, GamePhase::Aiming);
    }
}
