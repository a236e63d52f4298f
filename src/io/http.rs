use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_DOWNLOAD_BYTES, ProxyConfig, positive_or};
use crate::error::{ProxyError, Result};

/// Source of raw archive payloads.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Download the resource behind `url` in full.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// HTTP fetcher that spools bodies to an anonymous temp file.
///
/// The body is never buffered in memory while it is still arriving: chunks go
/// to disk and the transfer is aborted as soon as the running total passes
/// `max_bytes`. Only a completed, in-bounds download is read back. The temp
/// file is unlinked when it goes out of scope, on every exit path.
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
    temp_dir: Option<PathBuf>,
}

impl HttpFetcher {
    /// Zero limits in `config` fall back to the library defaults.
    pub fn new(config: &ProxyConfig) -> reqwest::Result<Self> {
        let timeout = if config.fetch_timeout.is_zero() {
            DEFAULT_FETCH_TIMEOUT
        } else {
            config.fetch_timeout
        };
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            max_bytes: positive_or(config.max_download_bytes, DEFAULT_MAX_DOWNLOAD_BYTES),
            temp_dir: config.temp_dir.clone(),
        })
    }

    fn spool_file(&self) -> std::io::Result<std::fs::File> {
        match &self.temp_dir {
            Some(dir) => tempfile::tempfile_in(dir),
            None => tempfile::tempfile(),
        }
    }

    fn too_large(&self, url: &str) -> ProxyError {
        ProxyError::PayloadTooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        }
    }
}

fn storage_error(err: std::io::Error) -> ProxyError {
    ProxyError::TransientStorage(err.to_string())
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProxyError::network(url, e))?;

        if !resp.status().is_success() {
            return Err(ProxyError::network(
                url,
                format!("HTTP request failed with status: {}", resp.status()),
            ));
        }

        // Reject early when the server announces an oversized body
        if let Some(announced) = resp.content_length() {
            if announced > self.max_bytes {
                warn!(url, announced, limit = self.max_bytes, "Refusing oversized download");
                return Err(self.too_large(url));
            }
        }

        let mut spool = tokio::fs::File::from_std(self.spool_file().map_err(storage_error)?);
        let mut total = 0u64;

        while let Some(chunk) = resp.chunk().await.map_err(|e| ProxyError::network(url, e))? {
            total += chunk.len() as u64;
            if total > self.max_bytes {
                warn!(url, received = total, limit = self.max_bytes, "Download exceeded size cap");
                return Err(self.too_large(url));
            }
            spool.write_all(&chunk).await.map_err(storage_error)?;
        }

        spool.flush().await.map_err(storage_error)?;
        spool.seek(SeekFrom::Start(0)).await.map_err(storage_error)?;

        let mut data = Vec::with_capacity(total as usize);
        spool.read_to_end(&mut data).await.map_err(storage_error)?;

        debug!(url, bytes = data.len(), "Fetched payload");
        Ok(Bytes::from(data))
    }
}
