//! Spark Break headless driver
//!
//! Plays sessions on autopilot with no window: the "player" aims at a random
//! point above the turret every round. Useful for soak-testing the simulation and
//! for eyeballing balance changes from a tuning file.
//!
//! Usage: `spark-break [seed] [rounds] [tuning.json]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use spark_break::Tuning;
use spark_break::consts::SIM_DT;
use spark_break::sim::{FixedStep, Game, GameEvent, GamePhase, TickInput};

/// Give up on a round that never comes home (about a minute of game time)
const MAX_TICKS_PER_ROUND: u32 = 60 * 60;

fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Bad tuning file {}: {}; using defaults", path, e);
                Tuning::default()
            }
        },
        Err(e) => {
            log::warn!("Can't read {}: {}; using defaults", path, e);
            Tuning::default()
        }
    }
}

/// Pick a point above the turret to aim at
fn pick_target(rng: &mut Pcg32, game: &Game) -> Vec2 {
    let tuning = game.tuning();
    Vec2::new(
        rng.random_range(0.0..tuning.canvas_width),
        rng.random_range(0.0..tuning.collection_line_y),
    )
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(1);
    let max_rounds: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(200);
    let tuning = load_tuning(args.get(2).map(String::as_str));

    log::info!("Spark Break (headless) seed {} for {} rounds", seed, max_rounds);

    let mut game = Game::new(seed, tuning);
    let mut player = Pcg32::seed_from_u64(seed ^ 0x5eed);
    let mut clock = FixedStep::new();
    game.start_session();

    let mut rounds = 0;
    'session: while rounds < max_rounds {
        if game.state().phase == GamePhase::Idle {
            let target = pick_target(&mut player, &game);
            clock.queue(&TickInput {
                pointer: Some(target),
                press: true,
                release: true,
            });
        }

        let mut ticks = 0;
        loop {
            ticks += clock.advance(&mut game, SIM_DT);

            for event in game.drain_events() {
                match event {
                    GameEvent::RoundResolved { .. } | GameEvent::StageCleared { .. } => {
                        rounds += 1;
                        match serde_json::to_string(&game.hud()) {
                            Ok(line) => println!("{line}"),
                            Err(e) => log::warn!("HUD serialization failed: {}", e),
                        }
                    }
                    GameEvent::GameOver { score, level } => {
                        println!("GAME OVER score={score} level={level}");
                        break 'session;
                    }
                    _ => {}
                }
            }

            if game.state().phase == GamePhase::Idle {
                break;
            }
            if ticks > MAX_TICKS_PER_ROUND {
                log::warn!("Round stuck after {} ticks, restarting", ticks);
                game.restart_session();
                break;
            }
        }
    }

    if let Some(best) = game.high_scores().best() {
        println!("Best score: {best}");
    }
}
