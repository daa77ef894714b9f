//! Concurrent job chain executor.
//!
//! ## Design
//!
//! - A fixed number of workers, each a tokio task with its own resources
//! - Jobs are handed to workers through a zero-capacity queue: a submit
//!   returns only once some worker has taken the job
//! - Each worker resolves a whole chain (root plus continuations) before
//!   accepting the next job
//! - Rate-limited nodes are retried with exponential backoff
//! - Two shutdown signals: queue closure (drain and exit) and cancellation
//!   (stop at the next suspension point)
//!
//! ## Components
//!
//! - `WorkerPool`: spawns workers, owns the queue, joins on shutdown
//! - `WorkerPool::run` / `WorkerPool::run_cmd`: feed parsed lines into the pool
//! - `CancelableLines`: line source over any async reader

pub mod feeder;
pub mod pool;
pub mod queue;
pub mod source;
mod worker;

pub use pool::{PoolError, WorkerPool};
pub use queue::SubmitError;
pub use source::CancelableLines;
