//! `fanout-core`: job chain model and the contracts the executor runs against.
//!
//! This crate contains **no IO and no scheduling**. It defines what a job is,
//! how failures are classified, how long to back off between retries, and the
//! collaborator traits (parser, line source, stats sink) the executor drives.

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod error;
pub mod id;
pub mod job;
pub mod source;
pub mod stats;

pub use backoff::{BackoffPolicy, should_retry};
pub use cancel::CancelContext;
pub use config::PoolConfig;
pub use error::{ConfigError, JobError, ParseError};
pub use id::JobId;
pub use job::{Action, Continuation, Job, JobParser, Outcome};
pub use source::{LineSource, ReadOutcome};
pub use stats::{StatKind, Stats, StatsSink, StatsSnapshot};
