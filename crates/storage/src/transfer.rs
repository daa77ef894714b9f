//! Chunked uploads and downloads between local files and the store.

use std::path::Path;
use std::sync::Arc;

use fanout_core::{StatKind, StatsSink};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::{StoreClient, StoreError};

/// Uploads local files into the store, `chunk_size` bytes per part.
///
/// The part buffer is allocated on the first upload and reused afterwards.
pub struct Uploader {
    client: StoreClient,
    chunk_size: usize,
    buf: Mutex<Vec<u8>>,
    stats: Arc<dyn StatsSink>,
}

impl Uploader {
    pub fn new(client: StoreClient, chunk_size: u64, stats: Arc<dyn StatsSink>) -> Self {
        Self {
            client,
            chunk_size: usize::try_from(chunk_size).unwrap_or(usize::MAX).max(1),
            buf: Mutex::new(Vec::new()),
            stats,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of bytes written.
    pub async fn upload(&self, src: &Path, key: &str) -> Result<u64, StoreError> {
        let context = src.display().to_string();
        self.stats.increment(StatKind::FileOp);
        let mut file = File::open(src)
            .await
            .map_err(|e| StoreError::from_io(&context, e))?;
        let mut object = self.client.create_object(key).await?;

        let mut buf = self.buf.lock().await;
        buf.resize(self.chunk_size, 0);
        let mut total = 0u64;
        let mut parts = 0u32;
        loop {
            let n = read_chunk(&mut file, &mut buf)
                .await
                .map_err(|e| StoreError::from_io(&context, e))?;
            if n == 0 {
                break;
            }
            object
                .write_all(&buf[..n])
                .await
                .map_err(|e| StoreError::from_io(key, e))?;
            total += n as u64;
            parts += 1;
        }
        object.flush().await.map_err(|e| StoreError::from_io(key, e))?;

        debug!(key, parts, bytes = total, "upload complete");
        Ok(total)
    }
}

/// Fill `buf` as far as the reader allows. Short only at end of file.
async fn read_chunk(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Downloads objects into local files.
pub struct Downloader {
    client: StoreClient,
    stats: Arc<dyn StatsSink>,
}

impl Downloader {
    pub fn new(client: StoreClient, stats: Arc<dyn StatsSink>) -> Self {
        Self { client, stats }
    }

    /// Returns the number of bytes written.
    pub async fn download(&self, key: &str, dst: &Path) -> Result<u64, StoreError> {
        let context = dst.display().to_string();
        let mut object = self.client.open_object(key).await?;

        self.stats.increment(StatKind::FileOp);
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::from_io(&context, e))?;
        }
        let mut file = File::create(dst)
            .await
            .map_err(|e| StoreError::from_io(&context, e))?;
        let bytes = tokio::io::copy(&mut object, &mut file)
            .await
            .map_err(|e| StoreError::from_io(&context, e))?;
        file.flush().await.map_err(|e| StoreError::from_io(&context, e))?;

        debug!(key, dst = %context, bytes, "download complete");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::Stats;

    #[tokio::test]
    async fn uploads_reuse_one_part_buffer() {
        let store = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let stats: Arc<dyn StatsSink> = Arc::new(Stats::new());
        let uploader = Uploader::new(StoreClient::new(store.path(), stats.clone()), 3, stats);

        for (name, contents) in [("a.txt", "abcdefgh"), ("b.txt", "xy")] {
            let src = local.path().join(name);
            std::fs::write(&src, contents).unwrap();
            assert_eq!(
                uploader.upload(&src, name).await.unwrap(),
                contents.len() as u64
            );
            assert_eq!(
                std::fs::read_to_string(store.path().join(name)).unwrap(),
                contents
            );
        }

        let buf = uploader.buf.lock().await;
        assert_eq!(buf.len(), 3);
    }
}
