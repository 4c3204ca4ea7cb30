use std::fs::read_to_string;
use std::path::PathBuf;

use clap::Parser;
use fleetplan::{OverCapacityPolicy, Problem, QuotaComparison};
use tracing_subscriber::EnvFilter;

/// Solve a flight and maintenance assignment problem and print the report as YAML.
#[derive(Parser)]
struct Args {
    /// Path to the YAML problem file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Wall-clock limit for the solver, in seconds
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<f64>,

    #[arg(long)]
    threads: Option<u32>,

    #[arg(long, value_enum)]
    quota_comparison: Option<QuotaComparison>,

    #[arg(long, value_enum)]
    over_capacity: Option<OverCapacityPolicy>,

    /// Let the solver print its own log
    #[arg(long)]
    solver_log: bool,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();
    let args = Args::parse();

    let buf = read_to_string(&args.input)?;
    let mut problem: Problem = serde_yaml::from_str(&buf)?;

    // Command line flags win over the document's options section
    let options = &mut problem.options;
    if let Some(seconds) = args.time_limit {
        options.solve.time_limit_seconds = Some(seconds);
    }
    if let Some(threads) = args.threads {
        options.solve.threads = Some(threads);
    }
    if let Some(comparison) = args.quota_comparison {
        options.model.quota_comparison = comparison;
    }
    if let Some(policy) = args.over_capacity {
        options.model.over_capacity = policy;
    }
    options.solve.solver_log |= args.solver_log;

    let report = problem.solve()?;

    println!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}
