//! # subfile-proxy
//!
//! On-demand subtitle extraction from remote ZIP and RAR archives.
//!
//! Subtitle search results frequently point at an archive (a single episode,
//! or a whole season pack) rather than at a subtitle file. This crate rewrites
//! such results to an opaque proxy path, `/subfile/<token>.srt`, and resolves
//! that path lazily: the archive is downloaded only when a player asks for it,
//! the entry matching the requested season/episode is picked, and only that
//! entry is decompressed.
//!
//! ## Features
//!
//! - Size-capped downloads spooled to transient storage, never buffered
//!   unbounded in memory
//! - Payload classification by magic bytes with URL-suffix fallback
//! - Season/episode aware entry selection (`S01E02`, `1x02`, `1x2`)
//! - ZIP (STORED/DEFLATE, ZIP64) and RAR extraction with a decompressed size cap
//! - Deduplication of identical in-flight requests and a FIFO-fair bound on
//!   simultaneous extractions
//!
//! ## Example
//!
//! ```no_run
//! use subfile_proxy::{ArchiveResolver, ProxyConfig, ProxyToken};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = ArchiveResolver::from_config(&ProxyConfig::default())?;
//!
//!     let token = ProxyToken::new("https://example.com/season-pack.zip", Some(1), Some(2))?;
//!     println!("serve at {}", token.proxy_path()?);
//!
//!     let subtitle = resolver.resolve_token(&token).await?;
//!     println!("{} bytes", subtitle.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod rar;
pub mod records;
pub mod scheduler;
pub mod server;
pub mod token;
pub mod zip;

pub use archive::{ArchiveType, detect, select_subtitle};
pub use cli::Cli;
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use io::{Fetch, HttpFetcher, MemoryReader, ReadAt};
pub use records::{SubtitleRecord, absolutize_urls, filter_by_language, request_base_url, rewrite_archive_records};
pub use scheduler::{ArchiveResolver, ExtractionKey};
pub use server::create_router;
pub use token::ProxyToken;
pub use zip::{ZipExtractor, ZipFileEntry};
