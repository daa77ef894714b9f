//! Per-worker execution loop.

use std::sync::Arc;

use fanout_core::{
    BackoffPolicy, CancelContext, Job, Outcome, PoolConfig, StatKind, StatsSink, should_retry,
};
use tracing::{debug, error, info, warn};

use crate::queue::JobReceiver;

/// How one chain node was resolved.
struct Resolution {
    outcome: Outcome,
    /// Cancellation cut a backoff sleep short.
    interrupted: bool,
}

impl Resolution {
    fn settled(outcome: Outcome) -> Self {
        Self {
            outcome,
            interrupted: false,
        }
    }
}

pub(crate) struct Worker<R> {
    id: usize,
    resources: R,
    receiver: JobReceiver<R>,
    max_retries: u32,
    backoff: BackoffPolicy,
    cancel: CancelContext,
    stats: Arc<dyn StatsSink>,
}

impl<R: Send + Sync + 'static> Worker<R> {
    pub(crate) fn new(
        id: usize,
        resources: R,
        receiver: JobReceiver<R>,
        config: &PoolConfig,
        cancel: CancelContext,
        stats: Arc<dyn StatsSink>,
    ) -> Self {
        Self {
            id,
            resources,
            receiver,
            max_retries: config.max_retries,
            backoff: config.backoff,
            cancel,
            stats,
        }
    }

    /// Serve chains until the queue closes or the run is cancelled.
    pub(crate) async fn run(self) {
        debug!(worker = self.id, "worker started");

        loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(job) => job,
                    None => break,
                },
            };

            if self.run_chain(job).await {
                // cancelled mid-backoff: this worker takes no further jobs
                break;
            }
        }

        debug!(worker = self.id, "worker exiting");
    }

    /// Resolve `root` and every continuation it leads to, in order.
    ///
    /// Returns whether cancellation interrupted a backoff along the way.
    async fn run_chain(&self, root: Job<R>) -> bool {
        let mut interrupted = false;
        let mut current = Some(root);

        while let Some(job) = current {
            let resolution = self.resolve(&job).await;
            interrupted |= resolution.interrupted;
            current = job.into_continuation(resolution.outcome).into_job();
        }

        interrupted
    }

    /// Execute one chain node, retrying rate-limited failures, until it
    /// succeeds or fails terminally.
    async fn resolve(&self, job: &Job<R>) -> Resolution {
        let mut retries = 0u32;

        loop {
            let err = match job.run(&self.resources).await {
                Ok(()) => {
                    info!(worker = self.id, job_id = %job.id(), "\"{job}\" OK");
                    self.stats.increment(StatKind::Success);
                    return Resolution::settled(Outcome::Succeeded);
                }
                Err(err) => err,
            };

            let mut interrupted = false;
            if should_retry(&err, retries, self.max_retries) {
                retries += 1;
                let delay = self.backoff.delay_for_attempt(retries);
                warn!(
                    worker = self.id,
                    job_id = %job.id(),
                    attempt = retries,
                    ?delay,
                    "ratelimit \"{job}\", sleep for {delay:?}"
                );

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => interrupted = true,
                    _ = tokio::time::sleep(delay) => {
                        self.stats.increment(StatKind::RetryOp);
                        continue;
                    }
                }
            }

            error!(
                worker = self.id,
                job_id = %job.id(),
                retries,
                "\"{job}\": {}",
                err.cleaned()
            );
            self.stats.increment(StatKind::Fail);
            return Resolution {
                outcome: Outcome::Failed,
                interrupted,
            };
        }
    }
}
