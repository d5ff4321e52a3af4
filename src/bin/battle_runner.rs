//! Headless Battle Runner
//!
//! Reads a battle configuration (JSON), resolves it and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sanguo_battle::battle::{BattleConfig, BattleEngine, BattleResult, Rulebook, SchedulerMode};
use sanguo_battle::core::{EngineConfig, Result};
use tracing::{debug, error};

/// Headless Battle Runner - resolve one battle from a JSON file
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Resolve a battle configuration and print the result")]
struct Args {
    /// Battle configuration file (JSON)
    path: PathBuf,

    /// Scheduler: mass or duel
    #[arg(long, default_value = "mass")]
    mode: String,

    /// Random seed, overriding the one in the file
    #[arg(long)]
    seed: Option<u64>,

    /// Engine constants override (TOML)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable verbose battle logging on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let directive = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(result) => {
            print_result(&result, &args.format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<BattleResult> {
    let config = match &args.rules {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut battle = BattleConfig::load(&args.path)?;
    battle.mode = match args.mode.as_str() {
        "duel" => SchedulerMode::Duel,
        "mass" => SchedulerMode::Mass,
        other => {
            eprintln!("Unknown mode '{}', defaulting to mass", other);
            SchedulerMode::Mass
        }
    };
    if let Some(seed) = args.seed {
        battle.seed = seed.into();
    }
    debug!(path = %args.path.display(), mode = ?battle.mode, "battle loaded");

    let engine = BattleEngine::new(Rulebook::standard(), config);
    Ok(engine.run(&battle))
}

fn print_result(result: &BattleResult, format: &str) {
    match format {
        "text" => {
            println!("Battle Result");
            println!("=============");
            for line in &result.log.lines {
                println!("{}", line);
            }
            println!();
            println!("Winner: {:?}", result.summary.winner);
            println!("Outcome: {:?}", result.summary.outcome);
            println!("Turns: {}", result.summary.turns);
            println!(
                "Attacker: {}/{} remaining",
                result.summary.attacker.remaining_hp, result.summary.attacker.initial_hp
            );
            println!(
                "Defender: {}/{} remaining",
                result.summary.defender.remaining_hp, result.summary.defender.initial_hp
            );
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            match serde_json::to_string_pretty(result) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}
