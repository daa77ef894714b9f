//! Worker pool controller.

use std::sync::Arc;

use fanout_core::{CancelContext, ConfigError, Job, PoolConfig, StatsSink};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::queue::{self, JobSender, SubmitError};
use crate::worker::Worker;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build resources for worker {worker}: {cause:#}")]
    Resources { worker: usize, cause: anyhow::Error },
}

/// A fixed-size pool of workers fed through a zero-capacity queue.
///
/// `R` is the per-worker resource set (storage clients and the like). Every
/// worker gets its own instance from the factory passed to
/// [`WorkerPool::new`]; nothing in `R` is shared between workers.
pub struct WorkerPool<R> {
    cancel: CancelContext,
    pub(crate) stats: Arc<dyn StatsSink>,
    sender: Option<JobSender<R>>,
    workers: Vec<JoinHandle<()>>,
}

impl<R: Send + Sync + 'static> WorkerPool<R> {
    /// Build one resource set per worker and spawn the workers.
    ///
    /// `factory` is called once per worker with the worker index. If any call
    /// fails, nothing is spawned. Must be called from within a tokio runtime.
    pub fn new<F>(
        config: PoolConfig,
        stats: Arc<dyn StatsSink>,
        cancel: CancelContext,
        mut factory: F,
    ) -> Result<Self, PoolError>
    where
        F: FnMut(usize, &PoolConfig) -> anyhow::Result<R>,
    {
        config.validate()?;

        let resources = (0..config.workers)
            .map(|worker| {
                factory(worker, &config).map_err(|cause| PoolError::Resources { worker, cause })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (sender, receiver) = queue::handoff();
        let workers = resources
            .into_iter()
            .enumerate()
            .map(|(id, resources)| {
                let worker = Worker::new(
                    id,
                    resources,
                    receiver.clone(),
                    &config,
                    cancel.clone(),
                    stats.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            workers = config.workers,
            max_retries = config.max_retries,
            chunk_size_bytes = config.chunk_size_bytes,
            "worker pool started"
        );

        Ok(Self {
            cancel,
            stats,
            sender: Some(sender),
            workers,
        })
    }

    /// Hand one job to the next free worker.
    ///
    /// Blocks until a worker accepts it. Fails if the run is cancelled first
    /// or the queue has been closed.
    pub async fn submit(&self, job: Job<R>) -> Result<(), SubmitError> {
        let sender = self.sender.as_ref().ok_or(SubmitError::Closed)?;
        sender.send(job, &self.cancel).await
    }

    /// Signal that no more jobs will arrive. Idempotent.
    pub fn close(&mut self) {
        if self.sender.take().is_some() {
            debug!("job queue closed");
        }
    }

    /// Close the queue if still open, then wait for every worker to exit.
    ///
    /// Without cancellation this drains the queue: every accepted chain is
    /// resolved before this returns.
    pub async fn join(mut self) {
        self.close();

        for (id, handle) in self.workers.drain(..).enumerate() {
            if let Err(err) = handle.await {
                error!(worker = id, error = %err, "worker task failed");
            }
        }

        debug!("worker pool drained");
    }
}
