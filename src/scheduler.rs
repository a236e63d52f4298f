//! Deduplicating, concurrency-bounded subtitle resolution.
//!
//! [`ArchiveResolver::resolve`] is the single entry point that ties fetch,
//! detection, selection and extraction together. Two pieces of shared state
//! live here and nowhere else:
//!
//! - the in-flight map, keyed by [`ExtractionKey`], which stores the pending
//!   shared future so identical concurrent requests attach to one operation;
//! - the slot pool, a fair semaphore, so operations are admitted in the order
//!   they start waiting for a slot.
//!
//! Admitted operations run on their own task. A caller that stops waiting does
//! not cancel the download or extraction; the next caller for the same key
//! picks up the result if it is still in flight.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::archive::{ArchiveType, detect};
use crate::config::{DEFAULT_MAX_SUBTITLE_BYTES, ProxyConfig, positive_or};
use crate::error::{ProxyError, Result};
use crate::io::{Fetch, HttpFetcher};
use crate::token::ProxyToken;
use crate::{rar, zip};

type PendingResolution = Shared<BoxFuture<'static, Result<Bytes>>>;

/// Identity of a resolution for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractionKey {
    pub original_url: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl From<&ProxyToken> for ExtractionKey {
    fn from(token: &ProxyToken) -> Self {
        Self {
            original_url: token.original_url.clone(),
            season: token.season,
            episode: token.episode,
        }
    }
}

/// Resolves proxy tokens to subtitle bytes. Cheap to clone; clones share
/// the same slot pool and in-flight map.
#[derive(Clone)]
pub struct ArchiveResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    fetcher: Arc<dyn Fetch>,
    /// `None` when concurrency is unbounded.
    slots: Option<Arc<Semaphore>>,
    in_flight: Mutex<HashMap<ExtractionKey, PendingResolution>>,
    max_subtitle_bytes: u64,
    temp_dir: Option<PathBuf>,
}

impl ArchiveResolver {
    pub fn new(config: &ProxyConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let slots = match config.extraction_concurrency {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        Self {
            inner: Arc::new(ResolverInner {
                fetcher,
                slots,
                in_flight: Mutex::new(HashMap::new()),
                max_subtitle_bytes: positive_or(config.max_subtitle_bytes, DEFAULT_MAX_SUBTITLE_BYTES),
                temp_dir: config.temp_dir.clone(),
            }),
        }
    }

    /// Resolver backed by the real HTTP fetcher.
    pub fn from_config(config: &ProxyConfig) -> reqwest::Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub async fn resolve_token(&self, token: &ProxyToken) -> Result<Bytes> {
        self.resolve(ExtractionKey::from(token)).await
    }

    /// Resolve one subtitle, joining an identical in-flight request if any.
    pub async fn resolve(&self, key: ExtractionKey) -> Result<Bytes> {
        let pending = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.get(&key) {
                Some(existing) => {
                    debug!(url = %key.original_url, "Joining in-flight extraction");
                    existing.clone()
                }
                None => {
                    // Spawned under the lock so the task's own eviction can
                    // never run before this insert
                    let pending = self.spawn_operation(key.clone());
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    fn spawn_operation(&self, key: ExtractionKey) -> PendingResolution {
        let inner = Arc::clone(&self.inner);
        let label = key.original_url.clone();

        let handle = tokio::spawn(async move {
            let result = inner.run(&key).await;
            inner.in_flight.lock().remove(&key);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ProxyError::extraction(&label, format!("extraction task failed: {e}"))))
        }
        .boxed()
        .shared()
    }
}

impl ResolverInner {
    async fn run(&self, key: &ExtractionKey) -> Result<Bytes> {
        // Held until this function returns, on success or failure
        let _slot = match &self.slots {
            Some(slots) => Some(
                Arc::clone(slots)
                    .acquire_owned()
                    .await
                    .map_err(|e| ProxyError::extraction(&key.original_url, e))?,
            ),
            None => None,
        };

        let url = key.original_url.as_str();
        let payload = self.fetcher.fetch(url).await?;
        let kind = detect(&payload, url);
        debug!(url, kind = kind.as_str(), bytes = payload.len(), "Classified payload");

        let limit = self.max_subtitle_bytes;
        match kind {
            ArchiveType::Zip => zip::extract_subtitle(payload, key.season, key.episode, limit).await,
            ArchiveType::Rar => {
                rar::extract_subtitle(payload, key.season, key.episode, limit, self.temp_dir.clone()).await
            }
            ArchiveType::Text => {
                if payload.len() as u64 > limit {
                    warn!(url, bytes = payload.len(), limit, "Plain subtitle exceeds cap");
                    return Err(ProxyError::SubtitleTooLarge {
                        name: url.to_string(),
                        size: payload.len() as u64,
                        limit,
                    });
                }
                Ok(payload)
            }
        }
    }
}
