//! Feeding command text into a [`WorkerPool`].

use fanout_core::{JobParser, LineSource, ReadOutcome, StatKind};
use tracing::{debug, error, warn};

use crate::pool::WorkerPool;
use crate::queue::SubmitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Continue,
    Stop,
}

impl<R: Send + Sync + 'static> WorkerPool<R> {
    /// Run a single command line through the pool and wait for it to drain.
    pub async fn run_cmd<P>(self, line: &str, parser: &P)
    where
        P: JobParser<R> + ?Sized,
    {
        self.feed_line(line, parser).await;
        self.join().await;
    }

    /// Feed every line of `source` into the pool, then wait for it to drain.
    ///
    /// Stops reading at end of input, on cancellation, or on a read error.
    /// Outcomes are reported through logs and the stats sink only.
    pub async fn run<S, P>(self, source: &mut S, parser: &P)
    where
        S: LineSource + ?Sized,
        P: JobParser<R> + ?Sized,
    {
        loop {
            match source.next_line().await {
                Ok(ReadOutcome::Line(line)) => {
                    if self.feed_line(&line, parser).await == Feed::Stop {
                        break;
                    }
                }
                Ok(ReadOutcome::Eof) => {
                    debug!("end of input");
                    break;
                }
                Ok(ReadOutcome::Cancelled) => {
                    debug!("input cancelled");
                    break;
                }
                Err(err) => {
                    error!(error = %err, "error reading input");
                    break;
                }
            }
        }

        self.join().await;
    }

    /// Parse one line and submit the resulting job.
    ///
    /// Blank lines and `#` comments are skipped. Unparseable lines are logged
    /// and counted as failures.
    async fn feed_line<P>(&self, line: &str, parser: &P) -> Feed
    where
        P: JobParser<R> + ?Sized,
    {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Feed::Continue;
        }

        let job = match parser.parse(line) {
            Ok(job) => job,
            Err(err) => {
                error!("\"{line}\": {err}");
                self.stats.increment(StatKind::Fail);
                return Feed::Continue;
            }
        };

        match self.submit(job).await {
            Ok(()) => Feed::Continue,
            Err(SubmitError::Cancelled) => {
                debug!("submission cancelled");
                Feed::Stop
            }
            Err(SubmitError::Closed) => {
                warn!("job queue closed, dropping \"{line}\"");
                Feed::Stop
            }
        }
    }
}
