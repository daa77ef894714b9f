//! Zero-capacity handoff between the feeder and the workers.
//!
//! The channel underneath has a single slot, so each delivery also carries an
//! acknowledgement. [`JobSender::send`] waits for that acknowledgement, which
//! is only sent by the worker that actually took the job.

use std::sync::Arc;

use fanout_core::{CancelContext, Job};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot};

struct Delivery<R> {
    job: Job<R>,
    accepted: oneshot::Sender<()>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Cancellation fired before a worker accepted the job.
    #[error("submission cancelled")]
    Cancelled,
    /// The queue is closed, or every worker has exited.
    #[error("job queue closed")]
    Closed,
}

/// Create a connected sender/receiver pair.
pub fn handoff<R>() -> (JobSender<R>, JobReceiver<R>) {
    let (tx, rx) = mpsc::channel(1);
    (
        JobSender { tx },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Submitting half. Dropping it closes the queue.
pub struct JobSender<R> {
    tx: mpsc::Sender<Delivery<R>>,
}

impl<R> JobSender<R> {
    /// Hand `job` to exactly one worker.
    ///
    /// Returns once a worker has accepted it. If `cancel` fires first the job
    /// is dropped without running.
    pub async fn send(&self, job: Job<R>, cancel: &CancelContext) -> Result<(), SubmitError> {
        let (accepted_tx, mut accepted_rx) = oneshot::channel();
        let delivery = Delivery {
            job,
            accepted: accepted_tx,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SubmitError::Cancelled),
            sent = self.tx.send(delivery) => sent.map_err(|_| SubmitError::Closed)?,
        }

        tokio::select! {
            biased;
            accepted = &mut accepted_rx => return accepted.map_err(|_| SubmitError::Closed),
            _ = cancel.cancelled() => {}
        }

        // Closing settles the race with the worker: either its acknowledgement
        // is already here and the job is running, or the worker will find the
        // channel closed and drop the job unrun.
        accepted_rx.close();
        match accepted_rx.try_recv() {
            Ok(()) => Ok(()),
            Err(_) => Err(SubmitError::Cancelled),
        }
    }
}

/// Receiving half, shared by all workers.
pub struct JobReceiver<R> {
    rx: Arc<Mutex<mpsc::Receiver<Delivery<R>>>>,
}

impl<R> Clone for JobReceiver<R> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<R> JobReceiver<R> {
    /// Wait for the next job.
    ///
    /// Returns `None` once the sender is gone and nothing is pending. Safe to
    /// drop mid-wait: no job is lost. Deliveries whose submitter already gave
    /// up on cancellation are discarded without running.
    pub async fn recv(&self) -> Option<Job<R>> {
        loop {
            let delivery = {
                let mut rx = self.rx.lock().await;
                rx.recv().await?
            };
            if delivery.accepted.send(()).is_ok() {
                return Some(delivery.job);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::{Action, JobError};
    use std::time::Duration;

    struct Noop;

    #[async_trait::async_trait]
    impl Action<()> for Noop {
        async fn run(&self, _resources: &()) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn job(label: &str) -> Job<()> {
        Job::new(label, Noop)
    }

    #[tokio::test(start_paused = true)]
    async fn send_blocks_until_a_worker_accepts() {
        let (tx, rx) = handoff::<()>();
        let cancel = CancelContext::new();
        let started = tokio::time::Instant::now();

        let receiver = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            rx.recv().await.map(|j| j.label().to_string())
        });

        tx.send(job("b"), &cancel).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(receiver.await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn dropping_sender_closes_queue() {
        let (tx, rx) = handoff::<()>();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_fails_once_receivers_are_gone() {
        let (tx, rx) = handoff::<()>();
        drop(rx);
        let err = tx.send(job("a"), &CancelContext::new()).await.unwrap_err();
        assert_eq!(err, SubmitError::Closed);
    }

    #[tokio::test]
    async fn cancelled_send_returns_without_delivery() {
        let (tx, _rx) = handoff::<()>();
        let cancel = CancelContext::new();
        cancel.cancel();

        let err = tx.send(job("a"), &cancel).await.unwrap_err();
        assert_eq!(err, SubmitError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_while_waiting_for_acceptance() {
        let (tx, _rx) = handoff::<()>();
        let cancel = CancelContext::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tx.send(job("a"), &cancel).await.unwrap_err();
        assert_eq!(err, SubmitError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_delivery_is_skipped_by_the_receiver() {
        let (tx, rx) = handoff::<()>();
        let cancel = CancelContext::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        // "a" sits in the channel slot when the submitter gives up
        let err = tx.send(job("a"), &cancel).await.unwrap_err();
        assert_eq!(err, SubmitError::Cancelled);

        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn acceptance_wins_over_later_cancellation() {
        let (tx, rx) = handoff::<()>();
        let cancel = CancelContext::new();

        let trigger = cancel.clone();
        let receiver = tokio::spawn(async move {
            let job = rx.recv().await;
            trigger.cancel();
            job.map(|j| j.label().to_string())
        });

        tx.send(job("a"), &cancel).await.unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(receiver.await.unwrap().as_deref(), Some("a"));
    }
}
