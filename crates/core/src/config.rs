//! Worker pool configuration.

use crate::backoff::BackoffPolicy;
use crate::error::ConfigError;

pub const DEFAULT_WORKERS: usize = 256;
pub const DEFAULT_CHUNK_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Number of workers to spawn
    pub workers: usize,
    /// Part size used by per-worker uploaders
    pub chunk_size_bytes: u64,
    /// Maximum retries per chain node (0 = no retries)
    pub max_retries: u32,
    /// Delay policy between retries
    pub backoff: BackoffPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl PoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size_bytes = bytes;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.chunk_size_bytes == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        self.backoff.validate()
    }
}
