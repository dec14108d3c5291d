//! Random self-play.
//!
//! Plays complete games with every faction choosing uniformly among its
//! legal orders, optionally sprinkling in ability use. Games run to a victory
//! or to `max_year` and are recorded phase by phase. Batches run in parallel
//! on a rayon pool; each game is seeded from the batch seed and its index, so
//! a batch is reproducible regardless of thread count.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::abilities::AbilityInvocation;
use crate::board::{Faction, Phase, FACTION_COUNT};
use crate::config::GameConfig;
use crate::error::{ConfigError, EngineError};
use crate::game::Game;
use crate::movegen::random_orders;
use crate::protocol::notation::format_orders;
use crate::victory::Victory;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub games: usize,
    /// Games still undecided after this year's Build phase stop as draws.
    pub max_year: u16,
    /// Worker threads. 0 lets rayon decide.
    pub threads: usize,
    pub seed: u64,
    pub players: Vec<Faction>,
    /// Chance per faction per Orders phase of invoking its ability.
    pub ability_rate: f64,
    pub game: GameConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            games: 10,
            max_year: 2400,
            threads: 0,
            seed: 1,
            players: crate::board::ALL_FACTIONS.to_vec(),
            ability_rate: 0.25,
            game: GameConfig::default(),
        }
    }
}

/// One resolved phase of a recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: String,
    /// Submitted orders in notation, by faction.
    pub orders: Vec<(Faction, String)>,
    /// Abilities invoked successfully, by faction.
    pub abilities: Vec<(Faction, String)>,
    pub dislodged: usize,
    /// Supply-center counts after the phase, indexed by faction.
    pub centers: [usize; FACTION_COUNT],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub seed: u64,
    pub players: Vec<Faction>,
    pub victory: Option<Victory>,
    pub final_phase: String,
    pub eliminated: Vec<Faction>,
    pub centers: [usize; FACTION_COUNT],
    pub latinum: u32,
    pub phases: Vec<PhaseRecord>,
}

/// Seed for game `game_id` of a batch.
pub fn game_seed(batch_seed: u64, game_id: usize) -> u64 {
    batch_seed.wrapping_add(game_id as u64)
}

/// Plays one game to completion or `config.max_year`.
pub fn play_game(config: &SimulationConfig, game_id: usize) -> Result<GameRecord, EngineError> {
    let seed = game_seed(config.seed, game_id);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut game = Game::new(config.game.clone().with_seed(seed), &config.players)?;
    let mut phases = Vec::new();

    while !game.is_over() && game.phase_id().year <= config.max_year {
        let phase = game.phase_id();
        let mut record = PhaseRecord {
            phase: phase.to_string(),
            orders: Vec::new(),
            abilities: Vec::new(),
            dislodged: 0,
            centers: [0; FACTION_COUNT],
        };

        for faction in game.pending_factions() {
            let orders = random_orders(game.board(), faction, game.position(), &mut rng);
            game.submit_orders(faction, phase, &orders)?;
            record.orders.push((faction, format_orders(game.board(), &orders)));
        }

        if phase.phase == Phase::Orders {
            for faction in game.state().active_factions() {
                if !rng.gen_bool(config.ability_rate) {
                    continue;
                }
                let Some(invocation) = random_ability(&game, faction, &mut rng) else {
                    continue;
                };
                match game.invoke_ability(faction, &invocation) {
                    Ok(_) => record.abilities.push((faction, invocation.name().to_string())),
                    Err(e) => debug!(game_id, faction = %faction, error = %e, "ability declined"),
                }
            }
        }

        let result = game.resolve()?;
        record.dislodged = result.dislodged.len();
        record.centers = game.position().center_counts();
        phases.push(record);
    }

    let state = game.state();
    let record = GameRecord {
        game_id,
        seed,
        players: state.players.clone(),
        victory: state.victory,
        final_phase: game.phase_id().to_string(),
        eliminated: state.eliminated.clone(),
        centers: game.position().center_counts(),
        latinum: state.ledger.balance(),
        phases,
    };
    match record.victory {
        Some(victory) => info!(game_id, %victory, phase = %record.final_phase, "game finished"),
        None => info!(game_id, phase = %record.final_phase, "game stopped at year limit"),
    }
    Ok(record)
}

/// Picks a plausible ability use for `faction`, if it has one.
fn random_ability(game: &Game, faction: Faction, rng: &mut impl Rng) -> Option<AbilityInvocation> {
    let board = game.board();
    let pos = game.position();
    match faction {
        Faction::Romulan => Some(AbilityInvocation::Intercept),
        Faction::Cardassian => Some(AbilityInvocation::Surveil),
        Faction::Breen => {
            let unit = *pos.units_of(Faction::Breen).choose(rng)?;
            let targets: Vec<_> = board.neighbors(unit).collect();
            let territory = *targets.choose(rng)?;
            Some(AbilityInvocation::Freeze { territory })
        }
        Faction::Ferengi => {
            let enemies: Vec<_> = pos.units().filter(|u| u.faction != Faction::Ferengi).collect();
            let target = enemies.choose(rng)?.territory;
            Some(AbilityInvocation::Bribe { target })
        }
        Faction::Federation | Faction::Klingon | Faction::Gorn => None,
    }
}

/// Plays `config.games` games in parallel. Records come back in game order.
pub fn run_simulations(config: &SimulationConfig) -> Result<Vec<GameRecord>, EngineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("thread pool: {e}")))?;
    info!(
        games = config.games,
        threads = pool.current_num_threads(),
        seed = config.seed,
        "simulating"
    );
    pool.install(|| {
        (0..config.games)
            .into_par_iter()
            .map(|i| play_game(config, i))
            .collect()
    })
}

/// Aggregate outcome counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub games: usize,
    pub solo: usize,
    pub allied: usize,
    pub economic: usize,
    pub last_standing: usize,
    pub unfinished: usize,
    /// Wins (including shared allied wins) indexed by faction.
    pub wins: [usize; FACTION_COUNT],
}

pub fn summarize(records: &[GameRecord]) -> Summary {
    let mut summary = Summary {
        games: records.len(),
        ..Summary::default()
    };
    for record in records {
        let Some(victory) = record.victory else {
            summary.unfinished += 1;
            continue;
        };
        match victory {
            Victory::Solo { .. } => summary.solo += 1,
            Victory::Allied { .. } => summary.allied += 1,
            Victory::Economic { .. } => summary.economic += 1,
            Victory::LastStanding { .. } => summary.last_standing += 1,
        }
        for faction in victory.winners() {
            summary.wins[faction.index()] += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(games: usize) -> SimulationConfig {
        SimulationConfig {
            games,
            max_year: 2372,
            threads: 2,
            seed: 7,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn game_stops_at_year_limit() {
        let record = play_game(&short(1), 0).unwrap();
        assert!(!record.phases.is_empty());
        if record.victory.is_none() {
            assert_eq!(record.final_phase, "spring-2373-orders");
        }
        assert_eq!(record.phases[0].phase, "spring-2370-orders");
    }

    #[test]
    fn same_seed_same_game() {
        let config = short(1);
        assert_eq!(play_game(&config, 0).unwrap(), play_game(&config, 0).unwrap());
    }

    #[test]
    fn parallel_batch_matches_sequential_games() {
        let config = short(4);
        let batch = run_simulations(&config).unwrap();
        assert_eq!(batch.len(), 4);
        for (i, record) in batch.iter().enumerate() {
            assert_eq!(record.game_id, i);
            assert_eq!(record, &play_game(&config, i).unwrap());
        }
    }

    #[test]
    fn summary_counts_unfinished() {
        let records = run_simulations(&short(3)).unwrap();
        let summary = summarize(&records);
        assert_eq!(summary.games, 3);
        assert_eq!(
            summary.solo
                + summary.allied
                + summary.economic
                + summary.last_standing
                + summary.unfinished,
            3
        );
    }
}
