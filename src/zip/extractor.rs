use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::archive::select_subtitle;
use crate::error::{ProxyError, Result};
use crate::io::{MemoryReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive, directories included.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser
            .list_files()
            .await
            .map_err(|e| ProxyError::UnsupportedOrCorruptArchive {
                kind: "ZIP",
                reason: format!("{e:#}"),
            })
    }

    /// Decompress one entry, refusing to produce more than `limit` bytes.
    ///
    /// The recorded size is checked first; DEFLATE output is additionally
    /// read through a `limit + 1` window so a header that understates the
    /// real size still cannot inflate past the cap.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry, limit: u64) -> Result<Vec<u8>> {
        let name = entry.file_name.as_str();

        if entry.is_encrypted() {
            return Err(ProxyError::extraction(name, "encrypted entries are not supported"));
        }
        if entry.uncompressed_size > limit {
            return Err(too_large(name, entry.uncompressed_size, limit));
        }

        let compressed = self
            .parser
            .read_compressed(entry)
            .await
            .map_err(|e| ProxyError::extraction(name, format!("{e:#}")))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                tokio::task::spawn_blocking(move || inflate_bounded(&compressed, limit))
                    .await
                    .map_err(|e| ProxyError::extraction(name, e))?
                    .map_err(|e| ProxyError::extraction(name, format!("corrupt DEFLATE stream: {e}")))?
            }
            CompressionMethod::Unknown(method) => {
                return Err(ProxyError::extraction(
                    name,
                    format!("Unsupported compression method: {method}"),
                ));
            }
        };

        if data.len() as u64 > limit {
            return Err(too_large(name, data.len() as u64, limit));
        }

        let crc = crc32fast::hash(&data);
        if crc != entry.crc32 {
            return Err(ProxyError::extraction(
                name,
                format!("CRC mismatch: expected {:08x}, got {:08x}", entry.crc32, crc),
            ));
        }

        Ok(data)
    }
}

fn too_large(name: &str, size: u64, limit: u64) -> ProxyError {
    ProxyError::SubtitleTooLarge {
        name: name.to_string(),
        size,
        limit,
    }
}

/// Inflate at most `limit + 1` bytes; one byte over is enough to reject.
fn inflate_bounded(compressed: &[u8], limit: u64) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(compressed)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)?;
    Ok(out)
}

/// Pull the best matching subtitle out of a downloaded ZIP payload.
pub async fn extract_subtitle(
    data: Bytes,
    season: Option<u32>,
    episode: Option<u32>,
    limit: u64,
) -> Result<Bytes> {
    let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(data)));
    let entries = extractor.list_files().await?;

    let files: Vec<&ZipFileEntry> = entries.iter().filter(|e| !e.is_directory).collect();
    let names: Vec<&str> = files.iter().map(|e| e.file_name.as_str()).collect();

    let chosen = select_subtitle(&names, season, episode)
        .ok_or(ProxyError::NoSubtitleFound { kind: "ZIP" })?;
    let Some(entry) = files.iter().find(|e| e.file_name == chosen) else {
        return Err(ProxyError::extraction(chosen, "entry vanished from listing"));
    };

    debug!(entry = chosen, entries = files.len(), "Selected ZIP entry");
    extractor.extract_to_memory(entry, limit).await.map(Bytes::from)
}
