//! Job chain model.
//!
//! A [`Job`] is one node of a chain: an action plus the job to run next on
//! success and the job to run next on failure. Exactly one continuation is
//! taken, once the node's final outcome is known.
//!
//! Continuations are owned, so a chain is a tree rooted at the submitted job
//! and cannot alias itself. There is no depth limit.

use core::fmt;

use crate::error::{JobError, ParseError};
use crate::id::JobId;

/// The work a job performs, given the resources of the worker running it.
///
/// Implementations must tolerate being invoked again after a rate-limited
/// failure.
#[async_trait::async_trait]
pub trait Action<R>: Send + Sync {
    async fn run(&self, resources: &R) -> Result<(), JobError>;
}

/// Final outcome of a chain node, after any retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// What follows a chain node for a given outcome.
pub enum Continuation<R> {
    /// The chain ends here.
    End,
    /// Run this job next, on the same worker.
    Then(Box<Job<R>>),
}

impl<R> Continuation<R> {
    pub fn is_end(&self) -> bool {
        matches!(self, Continuation::End)
    }

    pub fn into_job(self) -> Option<Job<R>> {
        match self {
            Continuation::End => None,
            Continuation::Then(job) => Some(*job),
        }
    }
}

impl<R> fmt::Debug for Continuation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::End => f.write_str("End"),
            Continuation::Then(job) => f.debug_tuple("Then").field(job).finish(),
        }
    }
}

/// A chain node.
pub struct Job<R> {
    id: JobId,
    label: String,
    action: Box<dyn Action<R>>,
    on_success: Continuation<R>,
    on_failure: Continuation<R>,
}

impl<R> Job<R> {
    /// Create a job with no continuations.
    pub fn new(label: impl Into<String>, action: impl Action<R> + 'static) -> Self {
        Self {
            id: JobId::new(),
            label: label.into(),
            action: Box::new(action),
            on_success: Continuation::End,
            on_failure: Continuation::End,
        }
    }

    /// Run `next` after this job succeeds.
    pub fn on_success(mut self, next: Job<R>) -> Self {
        self.on_success = Continuation::Then(Box::new(next));
        self
    }

    /// Run `next` after this job fails terminally.
    pub fn on_failure(mut self, next: Job<R>) -> Self {
        self.on_failure = Continuation::Then(Box::new(next));
        self
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn success_continuation(&self) -> &Continuation<R> {
        &self.on_success
    }

    pub fn failure_continuation(&self) -> &Continuation<R> {
        &self.on_failure
    }

    /// Execute one attempt of this node's action.
    pub async fn run(&self, resources: &R) -> Result<(), JobError> {
        self.action.run(resources).await
    }

    /// Consume the node and hand back the continuation chosen by `outcome`.
    pub fn into_continuation(self, outcome: Outcome) -> Continuation<R> {
        match outcome {
            Outcome::Succeeded => self.on_success,
            Outcome::Failed => self.on_failure,
        }
    }
}

impl<R> fmt::Display for Job<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<R> fmt::Debug for Job<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("on_success", &self.on_success)
            .field("on_failure", &self.on_failure)
            .finish_non_exhaustive()
    }
}

/// Turns one line of command text into a job chain.
pub trait JobParser<R>: Send + Sync {
    fn parse(&self, line: &str) -> Result<Job<R>, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Counting {
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Action<()> for Counting {
        async fn run(&self, _resources: &()) -> Result<(), JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(JobError::other("nope"))
            } else {
                Ok(())
            }
        }
    }

    fn job(label: &str, fail: bool) -> (Job<()>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let job = Job::new(
            label,
            Counting {
                calls: calls.clone(),
                fail,
            },
        );
        (job, calls)
    }

    #[test]
    fn new_job_has_no_continuations() {
        let (job, _) = job("cp a b", false);
        assert_eq!(job.label(), "cp a b");
        assert_eq!(job.to_string(), "cp a b");
        assert!(job.success_continuation().is_end());
        assert!(job.failure_continuation().is_end());
    }

    #[test]
    fn outcome_selects_continuation() {
        let (ok_next, _) = job("on-ok", false);
        let (err_next, _) = job("on-err", false);
        let (root, _) = job("root", false);
        let root = root.on_success(ok_next).on_failure(err_next);

        let next = root.into_continuation(Outcome::Failed).into_job().unwrap();
        assert_eq!(next.label(), "on-err");
        assert!(next.into_continuation(Outcome::Succeeded).is_end());
    }

    #[test]
    fn debug_shows_chain_shape() {
        let (next, _) = job("second", false);
        let (root, _) = job("first", false);
        let rendered = format!("{:?}", root.on_success(next));

        assert!(rendered.contains("\"first\""));
        assert!(rendered.contains("Then(Job"));
        assert!(rendered.contains("\"second\""));
    }

    #[tokio::test]
    async fn run_invokes_action_each_time() {
        let (ok, ok_calls) = job("ok", false);
        let (bad, bad_calls) = job("bad", true);

        assert!(ok.run(&()).await.is_ok());
        assert!(bad.run(&()).await.is_err());
        assert!(bad.run(&()).await.is_err());

        assert_eq!(ok_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad_calls.load(Ordering::SeqCst), 2);
    }
}
