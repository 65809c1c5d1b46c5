use anyhow::{Context, Result};
use bench_suite_types::{CONNECTIONS_PER_VIP_FLAG, PART_SIZE_FLAG, PartSize};
use serde::Deserialize;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// Command line surface of the sweep.
///
/// Everything after `--` is the benchmark command; the sweep appends
/// `--part-size` and `--connections-per-vip` to it for every trial.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SweepArgs {
    /// Part sizes to try, e.g. `512K 1M 8M` (K and M are powers of 1024).
    #[arg(long = "part-size", value_name = "SIZE", num_args = 1..)]
    pub part_size: Vec<String>,

    /// Connection counts to try for every part size.
    #[arg(
        long = "connections-per-vip",
        value_name = "COUNT",
        num_args = 1..,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub connections_per_vip: Vec<u32>,

    /// JSON file with `part_size` and/or `connections_per_vip` lists.
    /// Lists given on the command line take precedence.
    #[arg(long, value_name = "PATH")]
    pub sweep_file: Option<PathBuf>,

    /// The benchmark command and its fixed arguments.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingCommand,
    MissingValues(&'static str),
    ReservedFlag(&'static str),
    ZeroConnections,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingCommand => {
                write!(f, "missing remaining args: expected `--` followed by the benchmark command")
            }
            ConfigError::MissingValues(flag) => {
                write!(f, "{} needs at least one value", flag)
            }
            ConfigError::ReservedFlag(flag) => write!(
                f,
                "the benchmark command must not contain {}, it is appended for every trial",
                flag
            ),
            ConfigError::ZeroConnections => {
                write!(f, "{} values must be at least 1", CONNECTIONS_PER_VIP_FLAG)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SweepFile {
    part_size: Option<Vec<PartSize>>,
    connections_per_vip: Option<Vec<u32>>,
}

impl SweepFile {
    fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open sweep file {}", path.display()))?,
        );
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse sweep file {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub part_sizes: Vec<PartSize>,
    pub connections_per_vip: Vec<u32>,
    pub command: Vec<String>,
}

impl SweepConfig {
    pub fn new(args: SweepArgs) -> Result<Self> {
        let SweepArgs {
            part_size,
            connections_per_vip,
            sweep_file,
            command,
        } = args;

        if command.is_empty() {
            return Err(ConfigError::MissingCommand.into());
        }
        for flag in [PART_SIZE_FLAG, CONNECTIONS_PER_VIP_FLAG] {
            if command.iter().any(|arg| arg == flag) {
                return Err(ConfigError::ReservedFlag(flag).into());
            }
        }

        let file = match &sweep_file {
            Some(path) => SweepFile::load(path)?,
            None => SweepFile::default(),
        };

        let part_sizes = if part_size.is_empty() {
            file.part_size.unwrap_or_default()
        } else {
            part_size.into_iter().map(PartSize::new).collect()
        };
        let connections_per_vip = if connections_per_vip.is_empty() {
            file.connections_per_vip.unwrap_or_default()
        } else {
            connections_per_vip
        };

        if part_sizes.is_empty() {
            return Err(ConfigError::MissingValues(PART_SIZE_FLAG).into());
        }
        if connections_per_vip.is_empty() {
            return Err(ConfigError::MissingValues(CONNECTIONS_PER_VIP_FLAG).into());
        }
        // clap enforces this for the command line, the sweep file is checked here
        if connections_per_vip.contains(&0) {
            return Err(ConfigError::ZeroConnections.into());
        }

        Ok(Self {
            part_sizes,
            connections_per_vip,
            command,
        })
    }

    /// Every (part size, connection count) pair, part sizes in the outer loop.
    pub fn grid(&self) -> impl Iterator<Item = (&PartSize, u32)> {
        self.part_sizes.iter().flat_map(|part_size| {
            self.connections_per_vip
                .iter()
                .map(move |&connections| (part_size, connections))
        })
    }

    /// The benchmark executable, `None` only for a hand-built config without a command.
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}
