use std::path::PathBuf;

use clap::Parser;
use fanout_core::PoolConfig;
use fanout_core::config::{DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};

const MIB: u64 = 1024 * 1024;

/// Run storage commands in parallel, with retry on throttling.
#[derive(Parser, Debug)]
#[command(name = "fanout", version)]
#[command(about = "Parallel executor for object store commands", long_about = None)]
pub struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'n', long = "numworkers", env = "FANOUT_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Upload part size in MiB
    #[arg(short = 'c', long = "chunk-size", env = "FANOUT_CHUNK_SIZE_MB", default_value_t = 50)]
    pub chunk_size_mb: u64,

    /// Retries per command when throttled (0 disables retry)
    #[arg(short = 'r', long = "retries", env = "FANOUT_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Read commands from a file, one per line ("-" for stdin)
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "command")]
    pub file: Option<String>,

    /// Directory serving as the object store root
    #[arg(long = "store-root", env = "FANOUT_STORE_ROOT", value_name = "DIR")]
    pub store_root: PathBuf,

    /// Emit JSON log lines
    #[arg(long = "json-logs")]
    pub json_logs: bool,

    /// Single command to run, e.g. `cp ./a.txt store://a.txt`
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "file"
    )]
    pub command: Vec<String>,
}

/// Where commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
    Command(String),
}

impl Cli {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::default()
            .with_workers(self.workers)
            .with_chunk_size(self.chunk_size_mb.saturating_mul(MIB))
            .with_max_retries(self.retries)
    }

    pub fn input(&self) -> Input {
        match self.file.as_deref() {
            Some("-") => Input::Stdin,
            Some(path) => Input::File(PathBuf::from(path)),
            None => Input::Command(self.command.join(" ")),
        }
    }
}
