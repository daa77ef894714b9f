//! Cancelable line reader.

use std::io;
use std::path::Path;

use fanout_core::{CancelContext, LineSource, ReadOutcome};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads lines from any async reader, giving up as soon as the run is
/// cancelled.
pub struct CancelableLines<B> {
    lines: Lines<B>,
    cancel: CancelContext,
}

impl<B: AsyncBufRead + Unpin + Send> CancelableLines<B> {
    pub fn new(reader: B, cancel: CancelContext) -> Self {
        Self {
            lines: reader.lines(),
            cancel,
        }
    }
}

impl CancelableLines<BufReader<Stdin>> {
    pub fn stdin(cancel: CancelContext) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), cancel)
    }
}

impl CancelableLines<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>, cancel: CancelContext) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file), cancel))
    }
}

#[async_trait::async_trait]
impl<B: AsyncBufRead + Unpin + Send> LineSource for CancelableLines<B> {
    async fn next_line(&mut self) -> io::Result<ReadOutcome> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(ReadOutcome::Cancelled),
            line = self.lines.next_line() => Ok(match line? {
                Some(line) => ReadOutcome::Line(line),
                None => ReadOutcome::Eof,
            }),
        }
    }
}
