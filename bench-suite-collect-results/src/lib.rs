use anyhow::{Context, Result};
use bench_suite_types::{Throughput, Trial};
use lazy_read::{self, LazyRead};
use std::io::Read;

/// Captured output of one benchmark process.
pub trait OutputInfoInterface {
    fn content_string(&mut self) -> Result<&str>;
    fn content_bytes(&mut self) -> Result<&[u8]>;
}

pub struct OutputInfo<'a, T>
where
    T: Read,
{
    content: lazy_read::LazyRead<T>,
    program: &'a str,
}

impl<'a, T> OutputInfoInterface for OutputInfo<'a, T>
where
    T: Read,
{
    fn content_string(&mut self) -> Result<&str> {
        self.content
            .get_string()
            .with_context(|| format!("Failed to read the output of {}", self.program))
    }
    fn content_bytes(&mut self) -> Result<&[u8]> {
        self.content
            .get_bytes()
            .with_context(|| format!("Failed to read the output of {}", self.program))
    }
}

impl<'a, T> OutputInfo<'a, T>
where
    T: std::io::Read,
{
    pub fn new(program: &'a str, content: T) -> Self {
        OutputInfo {
            program,
            content: LazyRead::new(content),
        }
    }
}

/// Turns the output of a trial into its reported throughput.
///
/// `process_output` is called once per trial with the captured stdout; `get_result`
/// consumes the collector afterwards and fails when nothing usable was seen.
pub trait BenchSuiteCollect {
    fn process_output(&mut self, trial: &Trial, output: &mut dyn OutputInfoInterface)
    -> Result<()>;

    fn get_result(self: Box<Self>, trial: &Trial) -> Result<Throughput>;
}
