//! # reseq-demo
//!
//! Runs reassembly scenarios and logs every arrival, commit, duplicate and
//! status report.
//!
//! ## Usage
//!
//! ```bash
//! # All built-in scenarios
//! reseq-demo
//!
//! # One built-in scenario, debug logging (shows buffer contents)
//! RUST_LOG=debug reseq-demo --scenario missing
//!
//! # Scenarios from a file, reports as JSON
//! reseq-demo --config scenarios.toml --json
//!
//! # A random impaired stream
//! reseq-demo --words "the quick brown fox" --seed 7 --duplicate-percent 20 --holdback-percent 25
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reseq_sim::config;
use reseq_sim::impairment::ImpairmentConfig;
use reseq_sim::scenario::{Scenario, BUILTIN_SCENARIOS};
use reseq_sim::{run_scenario, ScenarioReport};

/// Packet reassembly scenario runner.
#[derive(Parser, Debug)]
#[command(name = "reseq-demo", about = "Run in-order reassembly scenarios")]
struct Cli {
    /// Built-in scenario to run (repeatable). Defaults to all of them.
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// TOML file with additional scenarios.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Space-separated words to send through a simulated impaired network.
    #[arg(long)]
    words: Option<String>,

    /// Impairment seed for --words.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Chance (0-100) that a packet is duplicated.
    #[arg(long, default_value_t = 0.0)]
    duplicate_percent: f32,

    /// Chance (0-100) that a packet only arrives after a timeout.
    #[arg(long, default_value_t = 0.0)]
    holdback_percent: f32,

    /// Deliver --words in sequence order.
    #[arg(long, default_value_t = false)]
    no_shuffle: bool,

    /// Print each report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// List built-in scenarios and exit.
    #[arg(long, default_value_t = false)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    if cli.list {
        for name in BUILTIN_SCENARIOS {
            if let Some(s) = Scenario::builtin(name) {
                println!("{:<12} {}", s.name, s.description);
            }
        }
        return Ok(());
    }

    // ── Collect scenarios ───────────────────────────────────────
    let mut scenarios = Vec::new();
    for name in &cli.scenarios {
        match Scenario::builtin(name) {
            Some(s) => scenarios.push(s),
            None => bail!(
                "unknown scenario {name:?} (available: {})",
                BUILTIN_SCENARIOS.join(", ")
            ),
        }
    }

    if let Some(path) = &cli.config {
        let loaded = config::load(path)
            .with_context(|| format!("loading scenarios from {}", path.display()))?;
        tracing::info!(path = %path.display(), count = loaded.len(), "scenarios loaded");
        scenarios.extend(loaded);
    }

    if let Some(words) = &cli.words {
        let words: Vec<&str> = words.split_whitespace().collect();
        if words.is_empty() {
            bail!("--words needs at least one word");
        }
        let impairment = ImpairmentConfig {
            seed: cli.seed,
            shuffle: !cli.no_shuffle,
            duplicate_percent: cli.duplicate_percent,
            holdback_percent: cli.holdback_percent,
        };
        scenarios.push(
            Scenario::from_words("words", words.as_slice(), &impairment)
                .with_description(format!("seed {}", cli.seed)),
        );
    }

    if scenarios.is_empty() {
        scenarios = Scenario::builtins();
    }

    // ── Run ─────────────────────────────────────────────────────
    let reports: Vec<ScenarioReport> = scenarios.iter().map(run_scenario).collect();

    if cli.json {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
    } else {
        for report in &reports {
            println!(
                "{:<12} {:?} (next expected {}, pending {}, delivered {})",
                report.name,
                report.summary.message,
                report.summary.expected,
                report.summary.pending,
                report.summary.delivered,
            );
        }
    }

    Ok(())
}
