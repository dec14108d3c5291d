//! Quadrant -- a line-oriented adjudicator for seven-faction galactic Diplomacy.
//!
//! Reads commands from stdin and answers each with one JSON line on stdout.
//! Logs go to stderr, filtered by `RUST_LOG` (default `quadrant=info`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use quadrant::board::{Faction, ALL_FACTIONS};
use quadrant::config::GameConfig;
use quadrant::error::EngineError;
use quadrant::game::Game;
use quadrant::protocol::{
    parse_command, parse_orders, AbilityArgs, AllianceAction, Command, OutcomeReport, StatusReport,
    SubmissionSummary, TurnReport,
};

#[derive(Parser, Debug)]
#[command(name = "quadrant", version, about = "Line-oriented galactic Diplomacy adjudicator")]
struct Args {
    /// Game configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,
}

/// One reply line.
#[derive(Debug, Serialize)]
#[serde(tag = "response", rename_all = "snake_case")]
enum Response {
    Ready { phase: String, players: Vec<Faction> },
    Submission(SubmissionSummary),
    Ability { faction: Faction, outcome: OutcomeReport },
    Alliance { action: &'static str, actor: Faction, other: Faction },
    Turn(TurnReport),
    Status(StatusReport),
    Error { message: String, fatal: bool },
}

impl Response {
    fn error(message: impl ToString) -> Self {
        Response::Error {
            message: message.to_string(),
            fatal: false,
        }
    }
}

impl From<EngineError> for Response {
    fn from(e: EngineError) -> Self {
        Response::Error {
            fatal: e.is_fatal(),
            message: e.to_string(),
        }
    }
}

struct Driver {
    config: GameConfig,
    game: Option<Game>,
}

impl Driver {
    fn handle(&mut self, command: Command) -> Response {
        if let Command::NewGame { factions } = command {
            return self.new_game(&factions);
        }
        let Some(game) = self.game.as_mut() else {
            return Response::error("no game in progress, send newgame first");
        };

        match command {
            Command::Orders { faction, orders } => {
                let orders = match parse_orders(game.board(), &orders) {
                    Ok(o) => o,
                    Err(e) => return Response::error(e),
                };
                match game.submit_orders(faction, game.phase_id(), &orders) {
                    Ok(report) => {
                        Response::Submission(SubmissionSummary::new(game.board(), &report))
                    }
                    Err(e) => Response::error(e),
                }
            }
            Command::Ability { faction, args } => ability(game, faction, &args),
            Command::Ally { action, actor, other } => {
                let result = match action {
                    AllianceAction::Propose => game.propose_alliance(actor, other),
                    AllianceAction::Accept => game.accept_alliance(actor, other),
                    AllianceAction::Reject => game.reject_alliance(actor, other),
                    AllianceAction::Break => game.break_alliance(actor, other),
                };
                match result {
                    Ok(()) => Response::Alliance {
                        action: action.name(),
                        actor,
                        other,
                    },
                    Err(e) => Response::error(e),
                }
            }
            Command::Resolve => match game.resolve() {
                Ok(result) => Response::Turn(TurnReport::new(game.board(), &result)),
                Err(e) => {
                    if e.is_fatal() {
                        error!(error = %e, "resolution aborted");
                    }
                    e.into()
                }
            },
            Command::Status => Response::Status(StatusReport::new(game)),
            Command::NewGame { .. } | Command::Quit => Response::error("unexpected command"),
        }
    }

    fn new_game(&mut self, factions: &[Faction]) -> Response {
        let players = if factions.is_empty() { &ALL_FACTIONS[..] } else { factions };
        match Game::new(self.config.clone(), players) {
            Ok(game) => {
                let response = Response::Ready {
                    phase: game.phase_id().to_string(),
                    players: game.state().players.clone(),
                };
                self.game = Some(game);
                response
            }
            Err(e) => e.into(),
        }
    }
}

fn ability(game: &mut Game, faction: Faction, args: &AbilityArgs) -> Response {
    let invocation = match args.to_invocation(game.board()) {
        Ok(i) => i,
        Err(e) => return Response::error(e),
    };
    match game.invoke_ability(faction, &invocation) {
        Ok(outcome) => Response::Ability {
            faction,
            outcome: OutcomeReport::new(game.board(), &outcome),
        },
        Err(e) => e.into(),
    }
}

fn load_config(args: &Args) -> Result<GameConfig, EngineError> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    Ok(match args.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

fn write_line(out: &mut impl Write, response: &Response) -> io::Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quadrant=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(seed = config.rules.seed, "adjudicator ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut driver = Driver { config, game: None };

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };

        let response = match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => driver.handle(command),
            Err(e) => {
                warn!(error = %e, "bad command");
                Response::error(e)
            }
        };

        if let Err(e) = write_line(&mut out, &response) {
            error!(error = %e, "stdout closed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
