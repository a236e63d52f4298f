//! Error types for subtitle resolution.

use thiserror::Error;

/// Errors that can occur while resolving a proxied subtitle.
///
/// The enum is `Clone` because a single in-flight resolution hands the same
/// outcome to every caller waiting on it; underlying causes are therefore
/// carried as rendered strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Fetch failed, timed out, or ended on a non-2xx status.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The raw download exceeded the configured cap.
    #[error("payload from {url} exceeds {limit} bytes")]
    PayloadTooLarge { url: String, limit: u64 },

    /// The download could not be spooled to local temporary storage.
    #[error("transient storage failure: {0}")]
    TransientStorage(String),

    /// The archive directory could not be read at all.
    #[error("unsupported or corrupt {kind} archive: {reason}")]
    UnsupportedOrCorruptArchive { kind: &'static str, reason: String },

    /// The archive holds no entry with a subtitle extension.
    #[error("no subtitle file found in {kind} archive")]
    NoSubtitleFound { kind: &'static str },

    /// The selected entry (or plain payload) exceeds the subtitle cap.
    #[error("subtitle {name} is too large: {size} bytes (limit {limit})")]
    SubtitleTooLarge { name: String, size: u64, limit: u64 },

    /// The selected entry exists but could not be materialized.
    #[error("failed to extract {name}: {reason}")]
    ExtractionFailed { name: String, reason: String },

    /// The proxy token could not be decoded.
    #[error("malformed proxy token: {0}")]
    MalformedToken(String),
}

impl ProxyError {
    pub(crate) fn network(url: &str, reason: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn extraction(name: &str, reason: impl ToString) -> Self {
        Self::ExtractionFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = ProxyError> = std::result::Result<T, E>;
