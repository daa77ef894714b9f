//! Storage commands and how they run against a worker's resources.

use std::path::Path;

use fanout_core::{Action, JobError, StatKind};
use tracing::info;

use crate::client::StoreError;
use crate::location::Location;
use crate::resources::WorkerResources;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upload, download or server-side copy depending on the operands.
    Copy { src: Location, dst: Location },
    /// Copy, then delete the source.
    Move { src: Location, dst: Location },
    Remove(Location),
    /// Log every key under a prefix.
    List { prefix: String },
}

#[async_trait::async_trait]
impl Action<WorkerResources> for Command {
    async fn run(&self, res: &WorkerResources) -> Result<(), JobError> {
        match self {
            Command::Copy { src, dst } => {
                copy(res, src, dst).await?;
            }
            Command::Move { src, dst } => {
                copy(res, src, dst).await?;
                remove(res, src).await?;
            }
            Command::Remove(target) => remove(res, target).await?,
            Command::List { prefix } => {
                let keys = res.client.list(prefix).await?;
                for key in &keys {
                    info!(key = %key, "{}{key}", crate::location::STORE_SCHEME);
                }
                info!(prefix = %prefix, count = keys.len(), "listing complete");
            }
        }
        Ok(())
    }
}

async fn copy(res: &WorkerResources, src: &Location, dst: &Location) -> Result<u64, StoreError> {
    let dst = dst.join_source_name(src).await;
    match (src, &dst) {
        (Location::Local(path), Location::Store(key)) => res.uploader.upload(path, key).await,
        (Location::Store(key), Location::Local(path)) => res.downloader.download(key, path).await,
        (Location::Store(from), Location::Store(to)) => res.client.copy(from, to).await,
        (Location::Local(from), Location::Local(_)) => Err(StoreError::InvalidKey(format!(
            "{}: local to local copies are not supported",
            from.display()
        ))),
    }
}

async fn remove(res: &WorkerResources, target: &Location) -> Result<(), StoreError> {
    match target {
        Location::Store(key) => res.client.delete(key).await,
        Location::Local(path) => remove_local(res, path).await,
    }
}

async fn remove_local(res: &WorkerResources, path: &Path) -> Result<(), StoreError> {
    res.stats.increment(StatKind::FileOp);
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| StoreError::from_io(path.display().to_string(), e))
}
