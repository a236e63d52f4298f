//! Subtitle result records and the rewrites applied before they are served.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::archive::is_archive_url;
use crate::token::ProxyToken;

/// Note appended to records whose delivery goes through the proxy.
const ON_THE_FLY_NOTE: &str = "Extraction: on-the-fly";

/// One subtitle search result as handed to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleRecord {
    pub id: String,
    pub lang: String,
    pub url: String,
    #[serde(default)]
    pub release_info: String,
}

/// Point archive-backed records at the proxy route instead of the archive.
///
/// Records whose URL does not end in `.zip`/`.rar` pass through untouched, as
/// do archive URLs that cannot be turned into a token.
pub fn rewrite_archive_records(
    records: Vec<SubtitleRecord>,
    season: Option<u32>,
    episode: Option<u32>,
) -> Vec<SubtitleRecord> {
    records
        .into_iter()
        .map(|record| {
            if !is_archive_url(&record.url) {
                return record;
            }

            match ProxyToken::new(record.url.as_str(), season, episode).and_then(|token| token.proxy_path()) {
                Ok(proxy_path) => SubtitleRecord {
                    url: proxy_path,
                    release_info: format!("{} | {}", record.release_info, ON_THE_FLY_NOTE),
                    ..record
                },
                Err(err) => {
                    warn!(id = %record.id, error = %err, "Leaving archive record unproxied");
                    record
                }
            }
        })
        .collect()
}

/// Origin the client reached us on, honoring reverse proxy headers.
pub fn request_base_url(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let proto = header("x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or("127.0.0.1");

    format!("{proto}://{host}")
}

/// Prefix root-relative URLs (proxy paths) with `base`.
pub fn absolutize_urls(records: Vec<SubtitleRecord>, base: &str) -> Vec<SubtitleRecord> {
    let base = base.trim_end_matches('/');
    records
        .into_iter()
        .map(|mut record| {
            if record.url.starts_with('/') {
                record.url = format!("{base}{}", record.url);
            }
            record
        })
        .collect()
}

/// Keep records in `lang`; `all` or an empty filter keeps everything.
pub fn filter_by_language(records: Vec<SubtitleRecord>, lang: &str) -> Vec<SubtitleRecord> {
    let lang = lang.trim();
    if lang.is_empty() || lang.eq_ignore_ascii_case("all") {
        return records;
    }
    records
        .into_iter()
        .filter(|record| record.lang.eq_ignore_ascii_case(lang))
        .collect()
}
