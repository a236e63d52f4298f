//! Runtime limits for the subtitle proxy.

use std::path::PathBuf;
use std::time::Duration;

/// Default cap on an extracted (or plain) subtitle: 2 MiB.
pub const DEFAULT_MAX_SUBTITLE_BYTES: u64 = 2 * 1024 * 1024;

/// Default cap on a raw archive download: 20 MiB.
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Default overall timeout for the network leg of a fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(45);

/// Limits and tunables shared by the fetcher, extractors and scheduler.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Simultaneous extraction operations. `0` means unbounded.
    pub extraction_concurrency: usize,
    /// Cap on decompressed or plain subtitle size.
    pub max_subtitle_bytes: u64,
    /// Cap on raw download size.
    pub max_download_bytes: u64,
    pub fetch_timeout: Duration,
    /// Directory for transient download and RAR spool files.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            extraction_concurrency: 1,
            max_subtitle_bytes: DEFAULT_MAX_SUBTITLE_BYTES,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            temp_dir: None,
        }
    }
}

/// Treat zero as "not configured".
pub(crate) fn positive_or(value: u64, fallback: u64) -> u64 {
    if value == 0 { fallback } else { value }
}
