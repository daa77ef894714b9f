//! Line-oriented command input.

/// Result of reading one line from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its terminator.
    Line(String),
    /// The source is exhausted.
    Eof,
    /// The run was cancelled while waiting for input.
    Cancelled,
}

/// A source of command lines whose reads can be interrupted by cancellation.
#[async_trait::async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> std::io::Result<ReadOutcome>;
}
