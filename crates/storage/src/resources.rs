//! Per-worker storage resources.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, ensure};
use fanout_core::{PoolConfig, StatsSink};

use crate::client::StoreClient;
use crate::transfer::{Downloader, Uploader};

/// Everything a storage job needs. One instance per worker.
pub struct WorkerResources {
    pub client: StoreClient,
    pub uploader: Uploader,
    pub downloader: Downloader,
    pub stats: Arc<dyn StatsSink>,
}

impl WorkerResources {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &PoolConfig,
        stats: Arc<dyn StatsSink>,
    ) -> anyhow::Result<Self> {
        let root = root.into();
        let meta = std::fs::metadata(&root)
            .with_context(|| format!("store root {} is not accessible", root.display()))?;
        ensure!(meta.is_dir(), "store root {} is not a directory", root.display());

        // separate client instances so no handle is shared between the three
        Ok(Self {
            client: StoreClient::new(root.clone(), stats.clone()),
            uploader: Uploader::new(
                StoreClient::new(root.clone(), stats.clone()),
                config.chunk_size_bytes,
                stats.clone(),
            ),
            downloader: Downloader::new(StoreClient::new(root, stats.clone()), stats.clone()),
            stats,
        })
    }

    /// Factory for `WorkerPool::new`: builds fresh resources for each worker.
    pub fn factory(
        root: PathBuf,
        stats: Arc<dyn StatsSink>,
    ) -> impl FnMut(usize, &PoolConfig) -> anyhow::Result<Self> {
        move |worker, config| {
            Self::new(root.clone(), config, stats.clone())
                .with_context(|| format!("worker {worker}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::Stats;

    #[test]
    fn rejects_missing_root() {
        let stats: Arc<dyn StatsSink> = Arc::new(Stats::new());
        let err = WorkerResources::new("/no/such/store/root", &PoolConfig::default(), stats)
            .err()
            .unwrap();
        assert!(err.to_string().contains("not accessible"));
    }

    #[test]
    fn uploader_uses_configured_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let stats: Arc<dyn StatsSink> = Arc::new(Stats::new());
        let config = PoolConfig::default().with_chunk_size(4096);

        let mut factory = WorkerResources::factory(dir.path().to_path_buf(), stats);
        let resources = factory(0, &config).unwrap();

        assert_eq!(resources.uploader.chunk_size(), 4096);
        assert_eq!(resources.client.root(), dir.path());
    }
}
