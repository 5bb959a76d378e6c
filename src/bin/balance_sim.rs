//! Headless Balance Simulator
//!
//! Plays many seeded runs with the scripted party and reports how far they
//! get. Output is JSON (one summary plus per-run reports) or plain text.

use std::path::PathBuf;
use std::sync::Arc;

use ashen_court::catalog::DataCatalog;
use ashen_court::core::config::{BattleConfig, EngineConfig};
use ashen_court::core::error::Result;
use ashen_court::sim::{simulate_batch, BatchSummary, RunReport};
use clap::Parser;
use serde::Serialize;

/// Headless Balance Simulator - seeded runs for tuning
#[derive(Parser, Debug)]
#[command(name = "balance_sim")]
#[command(about = "Simulate seeded runs and report progression statistics")]
struct Args {
    /// Number of runs
    #[arg(long, default_value_t = 100)]
    runs: u64,

    /// First seed; runs use consecutive seeds from here
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Starting unit template id
    #[arg(long, default_value = "vanguard")]
    starting_unit: String,

    /// Engine tuning overrides (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Content catalog (TOML); built-in content when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Include every run report, not just the summary
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    summary: &'a BatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    reports: Option<Vec<&'a RunReport>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ashen_court=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    // Pacing is cosmetic; headless runs never wait on it
    config.battle.enemy_pacing_delay = BattleConfig::headless().enemy_pacing_delay;

    let catalog = match &args.catalog {
        Some(path) => Arc::new(DataCatalog::load(path)?),
        None => DataCatalog::builtin(),
    };
    catalog.require_unit(&args.starting_unit)?;

    let seeds: Vec<u64> = (0..args.runs).map(|i| args.seed.wrapping_add(i)).collect();
    let results = simulate_batch(Arc::new(config), catalog, &seeds, &args.starting_unit);
    let summary = BatchSummary::from_reports(&results);

    for (seed, result) in seeds.iter().zip(&results) {
        if let Err(e) = result {
            tracing::warn!(seed, error = %e, "Run failed");
        }
    }

    if args.format == "text" {
        println!(
            "{} runs from '{}': {} victories, mean level {:.1}, max level {}, mean gold {:.0}",
            summary.runs,
            args.starting_unit,
            summary.victories,
            summary.mean_level,
            summary.max_level,
            summary.mean_gold
        );
        if args.verbose {
            for report in results.iter().filter_map(|r| r.as_ref().ok()) {
                println!(
                    "  seed {:>6}: level {:>3} after {:>3} battles ({} turns), gold {}",
                    report.seed,
                    report.level_reached,
                    report.battles,
                    report.total_turns,
                    report.gold
                );
            }
        }
    } else {
        let output = Output {
            summary: &summary,
            reports: args
                .verbose
                .then(|| results.iter().filter_map(|r| r.as_ref().ok()).collect()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
