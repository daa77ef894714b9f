//! Outcome counters shared across workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Counter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// A chain node resolved successfully.
    Success,
    /// A chain node (or an unparseable command) resolved as failed.
    Fail,
    /// A rate-limited node was retried after its backoff elapsed.
    RetryOp,
    /// A request was issued against the object store.
    StorageOp,
    /// A local file was read, written or removed.
    FileOp,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Success,
        StatKind::Fail,
        StatKind::RetryOp,
        StatKind::StorageOp,
        StatKind::FileOp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Success => "success",
            StatKind::Fail => "fail",
            StatKind::RetryOp => "retry_op",
            StatKind::StorageOp => "storage_op",
            StatKind::FileOp => "file_op",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Increment-only statistics interface.
pub trait StatsSink: Send + Sync {
    fn increment(&self, kind: StatKind);
}

/// Lock-free counters, one per [`StatKind`].
#[derive(Debug, Default)]
pub struct Stats {
    counters: [AtomicU64; 5],
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatKind) -> u64 {
        self.counters[kind.index()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            success: self.get(StatKind::Success),
            fail: self.get(StatKind::Fail),
            retry_op: self.get(StatKind::RetryOp),
            storage_op: self.get(StatKind::StorageOp),
            file_op: self.get(StatKind::FileOp),
        }
    }

    /// Emit one summary line with every counter.
    pub fn log_summary(&self, elapsed: Duration) {
        let s = self.snapshot();
        info!(
            success = s.success,
            fail = s.fail,
            retry_op = s.retry_op,
            storage_op = s.storage_op,
            file_op = s.file_op,
            elapsed = ?elapsed,
            "run complete"
        );
    }
}

impl StatsSink for Stats {
    fn increment(&self, kind: StatKind) {
        self.counters[kind.index()].fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub success: u64,
    pub fail: u64,
    pub retry_op: u64,
    pub storage_op: u64,
    pub file_op: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn kinds_map_to_distinct_counters() {
        let stats = Stats::new();
        for (n, kind) in StatKind::ALL.iter().enumerate() {
            for _ in 0..=n {
                stats.increment(*kind);
            }
        }

        for (n, kind) in StatKind::ALL.iter().enumerate() {
            assert_eq!(stats.get(*kind), n as u64 + 1, "{}", kind.as_str());
        }
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(Stats::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        stats.increment(StatKind::Fail);
                        stats.increment(StatKind::RetryOp);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.fail, 8_000);
        assert_eq!(snap.retry_op, 8_000);
        assert_eq!(snap.success, 0);
    }

    #[test]
    fn snapshot_serializes_with_kind_names() {
        let stats = Stats::new();
        stats.increment(StatKind::StorageOp);

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["storage_op"], 1);
        assert_eq!(json["fail"], 0);
        assert_eq!(
            serde_json::to_value(StatKind::RetryOp).unwrap(),
            serde_json::json!("retry_op")
        );
    }
}
