//! Spread Sim CLI
//!
//! Run the built-in propagation scenarios over one or more seeds.

use clap::Parser;
use spread_sim::{RunExport, ScenarioId, ScenarioResult, ScenarioRunner, SimError};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Spreading simulation CLI
#[derive(Parser, Debug)]
#[command(name = "spread-sim")]
#[command(about = "Run deterministic spreading simulations over multilayer networks", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (dsaa, cascade, threshold, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Maximum number of epochs
    #[arg(short, long, default_value = "50")]
    epochs: usize,

    /// Stop after this many epochs without change
    #[arg(short, long)]
    patience: Option<usize>,

    /// Number of consecutive seeds to run (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Write reports and JSON exports into this directory
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Writes the logger report and the run export of one result.
fn write_report(dir: &Path, result: &ScenarioResult) -> Result<(), SimError> {
    let run_dir = dir.join(format!("{}_{}", result.scenario.name(), result.seed));
    result.logger.report(Some(&run_dir), &mut std::io::sink())?;

    let mut export = RunExport::new(result.scenario.name(), result.model, result.seed);
    export.record(&result.logger);
    export.finalize(result.passed, result.stop_reason);
    export.write_to_file(&run_dir.join("run.json"))
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    if !args.json {
        info!("Spread Sim v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: dsaa, cascade, threshold, all");
                std::process::exit(1);
            }
        }
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut errors: Vec<(ScenarioId, u64, String)> = Vec::new();
    let mut report_failed = false;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed)
            .with_epochs(args.epochs)
            .with_patience(args.patience);

        for scenario in &scenarios {
            let result = match runner.run(*scenario) {
                Ok(result) => result,
                Err(e) => {
                    error!("✗ {} (seed={}) ERROR: {}", scenario.name(), seed, e);
                    errors.push((*scenario, seed, e.to_string()));
                    continue;
                }
            };

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED after {} epochs",
                        scenario.name(),
                        seed,
                        result.epochs_run
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if let Some(dir) = &args.report {
                if let Err(e) = write_report(dir, &result) {
                    error!("Failed to write report: {}", e);
                    report_failed = true;
                }
            }

            all_results.push(result);
        }
    }

    // Summary
    let failed_count = all_results.iter().filter(|r| !r.passed).count() + errors.len();
    let total = all_results.len() + errors.len();
    let passed = all_results.iter().filter(|r| r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "model": r.model,
                    "seed": r.seed,
                    "passed": r.passed,
                    "epochs": r.epochs_run,
                    "stop_reason": r.stop_reason,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
            "errors": errors.iter().map(|(scenario, seed, message)| {
                serde_json::json!({
                    "scenario": scenario.name(),
                    "seed": seed,
                    "error": message,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("Failed to render summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
            for (scenario, seed, message) in &errors {
                error!("  - {} seed={}: {}", scenario.name(), seed, message);
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 || report_failed {
        std::process::exit(1);
    }
}
