use anyhow::Context;
use bench_suite_collect_results::BenchSuiteCollect;
use bench_suite_types::{Throughput, Trial};
use regex::Regex;
use std::sync::LazyLock;

static THROUGHPUT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ([0-9]+\.[0-9]+)MiB/s").unwrap());

/// Keeps the highest `MiB/s` reading a benchmark printed.
///
/// The benchmark may report several intermediate readings in one run; only the
/// peak is kept.
#[derive(Debug, Default)]
pub struct BenchSuiteCollectThroughput {
    readings: Vec<f64>,
}

impl BenchSuiteCollectThroughput {
    pub fn boxed() -> Box<dyn BenchSuiteCollect> {
        Box::new(Self::default())
    }
}

pub fn parse_readings(content: &str) -> anyhow::Result<Vec<f64>> {
    THROUGHPUT_REGEX
        .captures_iter(content)
        .map(|cap| {
            let value = cap.get(1).context("Missing throughput value")?.as_str();
            value
                .parse::<f64>()
                .with_context(|| format!("Failed to parse throughput {}", value))
        })
        .collect()
}

impl BenchSuiteCollect for BenchSuiteCollectThroughput {
    fn process_output(
        &mut self,
        _: &Trial,
        output: &mut dyn bench_suite_collect_results::OutputInfoInterface,
    ) -> anyhow::Result<()> {
        let content = output.content_string()?;
        self.readings.extend(parse_readings(content)?);
        Ok(())
    }

    fn get_result(self: Box<Self>, _: &Trial) -> anyhow::Result<Throughput> {
        self.readings
            .into_iter()
            .max_by(f64::total_cmp)
            .map(Throughput)
            .ok_or_else(|| anyhow::anyhow!("No throughput found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_suite_collect_results::OutputInfo;
    use std::io::Cursor;

    fn collect(output: &str) -> anyhow::Result<Throughput> {
        collect_bytes(output.as_bytes())
    }

    fn collect_bytes(output: &[u8]) -> anyhow::Result<Throughput> {
        let trial = Trial::new(1024 * 1024, 10);
        let mut collector = BenchSuiteCollectThroughput::boxed();
        let mut info = OutputInfo::new("download_crt", Cursor::new(output.to_vec()));
        collector.process_output(&trial, &mut info)?;
        collector.get_result(&trial)
    }

    #[test]
    fn takes_the_maximum_not_the_last() {
        let output = "iter 0: 150.25MiB/s\niter 1: 310.50MiB/s\niter 2: 200.00MiB/s\n";
        assert_eq!(collect(output).unwrap(), Throughput(310.5));
    }

    #[test]
    fn takes_the_maximum_not_the_first() {
        let output = "... 123.45MiB/s ... 200.00MiB/s";
        assert_eq!(collect(output).unwrap(), Throughput(200.0));
    }

    #[test]
    fn single_reading() {
        assert_eq!(collect("done: 42.0MiB/s").unwrap(), Throughput(42.0));
    }

    #[test]
    fn no_readings_is_an_error() {
        let err = collect("transferred 20 GiB\n").unwrap_err();
        assert_eq!(err.to_string(), "No throughput found");
    }

    #[test]
    fn readings_need_the_exact_shape() {
        // integer values, a missing leading space and other units are all ignored
        let output = "a 100MiB/s\nb:7.5MiB/s\nc 3.25GiB/s\nd 1.5 MiB/s\n";
        assert!(collect(output).is_err());
    }

    #[test]
    fn unreadable_output_names_the_program() {
        let err = collect_bytes(b" 1.0MiB/s \xff").unwrap_err();
        let msg = format!("{err:#}");
        assert!(
            msg.starts_with("Failed to read the output of download_crt: UTF8 Error"),
            "{msg}"
        );
    }

    #[test]
    fn parse_readings_keeps_output_order() {
        assert_eq!(
            parse_readings(" 1.0MiB/s 3.5MiB/s 2.25MiB/s").unwrap(),
            vec![1.0, 3.5, 2.25]
        );
    }
}
