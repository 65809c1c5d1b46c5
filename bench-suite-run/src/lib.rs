use anyhow::{Context, Result, anyhow};
use bench_suite_collect_results::{BenchSuiteCollect, OutputInfo, OutputInfoInterface};
use bench_suite_collector_throughput::BenchSuiteCollectThroughput;
use bench_suite_config::SweepConfig;
use bench_suite_types::{Throughput, Trial};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const HEADER: &str = "part size\tconnections per vip\tmax throughput";

/// Runs the benchmark once for `trial` and returns the peak throughput it printed.
pub fn run_once(command: &[String], trial: &Trial) -> Result<Throughput> {
    run_once_with(command, trial, BenchSuiteCollectThroughput::boxed())
}

/// Like [`run_once`], with the output handed to `collector` instead.
///
/// The trial arguments are appended after the template. The child's stdout is
/// captured, stdin and stderr are left attached to ours. A non-zero exit fails the trial
/// before the output is looked at.
pub fn run_once_with(
    command: &[String],
    trial: &Trial,
    mut collector: Box<dyn BenchSuiteCollect>,
) -> Result<Throughput> {
    let (program, fixed) = command
        .split_first()
        .context("The benchmark command is empty")?;
    let trial_args = trial.args();
    debug!(?command, ?trial_args, "spawning benchmark");

    let mut child = Command::new(program)
        .args(fixed)
        .args(&trial_args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    let stdout = child
        .stdout
        .take()
        .context("The benchmark stdout was not captured")?;
    let mut output = OutputInfo::new(program, stdout);
    // drain before waiting, the child blocks once the pipe is full
    let drained = output.content_bytes().map(|_| ());

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {}", program))?;
    if !status.success() {
        let argv: Vec<&str> = command
            .iter()
            .map(String::as_str)
            .chain(trial_args.iter().map(String::as_str))
            .collect();
        return Err(anyhow!("Command {:?} returned non-zero {}", argv, status));
    }
    drained?;

    collector.process_output(trial, &mut output)?;
    collector.get_result(trial)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub trials: usize,
    pub failed: usize,
}

/// Prints the header and one row per (part size, connection count) pair to `out`.
///
/// The first two columns of a row are flushed before its trial starts. A failed
/// trial is reported in its row and the sweep moves on; only errors writing to
/// `out` end it early.
pub fn run_sweep<W: Write>(config: &SweepConfig, out: &mut W) -> Result<SweepSummary> {
    writeln!(out, "{}", HEADER)?;
    out.flush()?;

    let mut summary = SweepSummary::default();
    for (part_size, connections_per_vip) in config.grid() {
        write!(out, "{}\t{}\t", part_size, connections_per_vip)?;
        out.flush()?;

        let start = Instant::now();
        let result = part_size
            .bytes()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                run_once(&config.command, &Trial::new(bytes, connections_per_vip))
            });
        let elapsed = start.elapsed();

        summary.trials += 1;
        match result {
            Ok(throughput) => {
                info!(
                    part_size = %part_size,
                    connections_per_vip,
                    %throughput,
                    ?elapsed,
                    "trial finished"
                );
                writeln!(out, "{}", throughput)?;
            }
            Err(e) => {
                summary.failed += 1;
                warn!(
                    part_size = %part_size,
                    connections_per_vip,
                    ?elapsed,
                    "trial failed: {:#}",
                    e
                );
                writeln!(out, "failed ({:#})", e)?;
            }
        }
        out.flush()?;
    }

    Ok(summary)
}
