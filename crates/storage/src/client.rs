//! Object store client backed by a local directory.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use fanout_core::{JobError, StatKind, StatsSink};
use thiserror::Error;
use tokio::fs::{self, File};
use tracing::debug;

/// Object store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0:?}")]
    InvalidKey(String),

    /// The backend asked us to slow down.
    #[error("throttled: {0}")]
    Throttled(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classify an io error for `context` (a key or a local path).
    pub fn from_io(context: impl Into<String>, err: io::Error) -> Self {
        let context = context.into();
        match err.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(context),
            io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock => {
                StoreError::Throttled(format!("{context}: {err}"))
            }
            _ => StoreError::Io {
                context,
                source: err,
            },
        }
    }
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Throttled(msg) => JobError::RateLimited(msg),
            other => JobError::Other(anyhow::Error::new(other)),
        }
    }
}

/// Client for one store root.
///
/// Each worker owns its own instance; the only shared piece is the stats sink.
#[derive(Clone)]
pub struct StoreClient {
    root: PathBuf,
    stats: Arc<dyn StatsSink>,
}

impl StoreClient {
    pub fn new(root: impl Into<PathBuf>, stats: Arc<dyn StatsSink>) -> Self {
        Self {
            root: root.into(),
            stats,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its path under the root.
    ///
    /// Keys must be non-empty relative paths made only of normal segments.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Size of an object in bytes.
    pub async fn head(&self, key: &str) -> Result<u64, StoreError> {
        let path = self.object_path(key)?;
        self.stats.increment(StatKind::StorageOp);
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))?;
        if !meta.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(meta.len())
    }

    pub async fn open_object(&self, key: &str) -> Result<File, StoreError> {
        let path = self.object_path(key)?;
        self.stats.increment(StatKind::StorageOp);
        File::open(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))
    }

    /// Create (or truncate) an object, creating intermediate prefixes.
    pub async fn create_object(&self, key: &str) -> Result<File, StoreError> {
        let path = self.object_path(key)?;
        self.stats.increment(StatKind::StorageOp);
        ensure_parent(&path).await.map_err(|e| StoreError::from_io(key, e))?;
        File::create(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))
    }

    /// Server-side copy.
    pub async fn copy(&self, src: &str, dst: &str) -> Result<u64, StoreError> {
        let from = self.object_path(src)?;
        let to = self.object_path(dst)?;
        self.stats.increment(StatKind::StorageOp);
        ensure_parent(&to).await.map_err(|e| StoreError::from_io(dst, e))?;
        let bytes = fs::copy(&from, &to)
            .await
            .map_err(|e| StoreError::from_io(src, e))?;
        debug!(src, dst, bytes, "object copied");
        Ok(bytes)
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        self.stats.increment(StatKind::StorageOp);
        fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))
    }

    /// Every key starting with `prefix`, sorted.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.stats.increment(StatKind::StorageOp);

        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| StoreError::from_io(dir.display().to_string(), e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::from_io(dir.display().to_string(), e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StoreError::from_io(path.display().to_string(), e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}
