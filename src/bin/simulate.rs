//! Batch self-play CLI.
//!
//! Plays seeded random games and writes one JSON `GameRecord` per line.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use quadrant::board::{Faction, ALL_FACTIONS};
use quadrant::config::GameConfig;
use quadrant::error::EngineError;
use quadrant::simulate::{run_simulations, summarize, GameRecord, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "simulate", version, about = "Random self-play for the quadrant engine")]
struct Args {
    /// Number of games to play.
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Stop undecided games after this year.
    #[arg(long, default_value_t = 2400)]
    max_year: u16,

    /// Worker threads, 0 for one per core.
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Batch seed. Game `i` uses `seed + i`.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Factions to seat, by name. Defaults to all seven.
    #[arg(long, value_delimiter = ',', value_parser = parse_faction)]
    factions: Vec<Faction>,

    /// Chance per faction per Orders phase of using its ability.
    #[arg(long, default_value_t = 0.25)]
    ability_rate: f64,

    /// Game configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_faction(s: &str) -> Result<Faction, String> {
    Faction::from_name(s).ok_or_else(|| format!("unknown faction '{s}'"))
}

fn write_jsonl<W: Write>(records: &[GameRecord], out: &mut W) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()
}

fn run(args: Args) -> Result<(), EngineError> {
    let game = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let config = SimulationConfig {
        games: args.games,
        max_year: args.max_year,
        threads: args.threads,
        seed: args.seed,
        players: if args.factions.is_empty() {
            ALL_FACTIONS.to_vec()
        } else {
            args.factions
        },
        ability_rate: args.ability_rate.clamp(0.0, 1.0),
        game,
    };

    let start = Instant::now();
    let records = run_simulations(&config)?;
    let summary = summarize(&records);
    info!(
        games = summary.games,
        solo = summary.solo,
        allied = summary.allied,
        economic = summary.economic,
        last_standing = summary.last_standing,
        unfinished = summary.unfinished,
        elapsed_s = start.elapsed().as_secs_f64(),
        "simulation finished"
    );

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(quadrant::error::ConfigError::Io)?;
            write_jsonl(&records, &mut BufWriter::new(file))
        }
        None => write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    written.map_err(quadrant::error::ConfigError::Io)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quadrant=info,simulate=info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
