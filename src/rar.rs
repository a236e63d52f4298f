//! RAR extraction through the bundled unrar library.
//!
//! unrar only reads archives from a path, so the payload is spooled to a
//! scoped temp file first. All of it runs on the blocking pool.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;
use unrar::Archive;

use crate::archive::select_subtitle;
use crate::error::{ProxyError, Result};

fn corrupt(reason: impl ToString) -> ProxyError {
    ProxyError::UnsupportedOrCorruptArchive {
        kind: "RAR",
        reason: reason.to_string(),
    }
}

/// Pull the best matching subtitle out of a downloaded RAR payload.
pub async fn extract_subtitle(
    data: Bytes,
    season: Option<u32>,
    episode: Option<u32>,
    limit: u64,
    temp_dir: Option<PathBuf>,
) -> Result<Bytes> {
    tokio::task::spawn_blocking(move || {
        let spool = spool_payload(&data, temp_dir.as_deref())?;

        let names = list_files(spool.path())?;
        let chosen = select_subtitle(&names, season, episode)
            .ok_or(ProxyError::NoSubtitleFound { kind: "RAR" })?;
        debug!(entry = chosen, entries = names.len(), "Selected RAR entry");

        read_entry(spool.path(), chosen, limit).map(Bytes::from)
    })
    .await
    .map_err(|e| ProxyError::extraction("RAR payload", e))?
}

fn spool_payload(data: &[u8], temp_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("subfile-").suffix(".rar");

    let mut spool = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ProxyError::TransientStorage(e.to_string()))?;

    spool
        .write_all(data)
        .and_then(|()| spool.flush())
        .map_err(|e| ProxyError::TransientStorage(e.to_string()))?;
    Ok(spool)
}

/// File names in archive order, directories skipped.
fn list_files(path: &Path) -> Result<Vec<String>> {
    let listing = Archive::new(path).open_for_listing().map_err(corrupt)?;

    let mut names = Vec::new();
    for header in listing {
        let header = header.map_err(corrupt)?;
        if header.is_directory() {
            continue;
        }
        names.push(header.filename.to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Walk headers until `chosen` and decompress only that entry.
fn read_entry(path: &Path, chosen: &str, limit: u64) -> Result<Vec<u8>> {
    let failed = |reason: String| ProxyError::extraction(chosen, reason);

    let mut archive = Archive::new(path)
        .open_for_processing()
        .map_err(|e| failed(e.to_string()))?;

    while let Some(header) = archive.read_header().map_err(|e| failed(e.to_string()))? {
        let entry = header.entry();
        let is_chosen = !entry.is_directory() && entry.filename.to_string_lossy() == chosen;
        let recorded = entry.unpacked_size;

        if !is_chosen {
            archive = header.skip().map_err(|e| failed(e.to_string()))?;
            continue;
        }

        if header.entry().is_encrypted() {
            return Err(failed("encrypted entries are not supported".to_string()));
        }
        if recorded > limit {
            return Err(ProxyError::SubtitleTooLarge {
                name: chosen.to_string(),
                size: recorded,
                limit,
            });
        }

        let (data, _rest) = header.read().map_err(|e| failed(e.to_string()))?;
        if data.len() as u64 > limit {
            return Err(ProxyError::SubtitleTooLarge {
                name: chosen.to_string(),
                size: data.len() as u64,
                limit,
            });
        }
        return Ok(data);
    }

    Err(failed("no header matched the selected entry".to_string()))
}
