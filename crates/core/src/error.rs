//! Error model shared by the executor and its collaborators.

use thiserror::Error;

/// Failure of a single job attempt.
///
/// Classification drives retry: only [`JobError::RateLimited`] is ever
/// retried. Everything else resolves the chain node on first occurrence.
#[derive(Debug, Error)]
pub enum JobError {
    /// The remote side throttled the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The attempt was abandoned because the run was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobError {
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn other(msg: impl core::fmt::Display) -> Self {
        Self::Other(anyhow::anyhow!("{msg}"))
    }

    /// Whether this failure is a throttling signal eligible for retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Single-line, human-readable rendering used in failure log lines.
    ///
    /// Includes the full cause chain and collapses embedded newlines and runs
    /// of whitespace.
    pub fn cleaned(&self) -> String {
        let raw = match self {
            Self::Other(err) => format!("{err:#}"),
            other => other.to_string(),
        };
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// A command line that could not be turned into a job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: expected {expected} argument(s), got {got}")]
    Arity {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `&&` or `||` with nothing after it, or used more than once.
    #[error("misplaced operator `{0}`")]
    Operator(String),
}

impl ParseError {
    pub fn arity(command: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::Arity {
            command: command.into(),
            expected,
            got,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Rejected pool configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("invalid backoff policy: {0}")]
    Backoff(String),
}
