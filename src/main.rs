use anyhow::Result;
use bench_suite_config::{SweepArgs, SweepConfig};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

/// Runs a throughput benchmark over every (part size, connections per vip) pair
/// and prints the peak MiB/s of each run as a tab separated table.
///
/// Example:
///   bench-suite-sweep --part-size 512K 1M 8M --connections-per-vip 10 20 -- \
///       target/release/examples/download_crt --region us-west-2 bucket test20GiB
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
struct Args {
    #[command(flatten)]
    sweep: SweepArgs,

    /// Log level for diagnostics on stderr; RUST_LOG takes precedence when set.
    #[arg(long, default_value_t = Level::WARN)]
    log: Level,
}

fn init_tracing(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log);

    let config = SweepConfig::new(args.sweep)?;
    info!(
        part_sizes = config.part_sizes.len(),
        connections_per_vip = config.connections_per_vip.len(),
        program = ?config.program(),
        "starting sweep"
    );

    let summary = bench_suite_run::run_sweep(&config, &mut std::io::stdout().lock())?;
    info!(
        trials = summary.trials,
        failed = summary.failed,
        "sweep finished"
    );

    Ok(())
}
