//! ZIP archive parsing and single-entry extraction.
//!
//! - [`structures`]: ZIP format records (EOCD, ZIP64 EOCD, entries)
//! - [`parser`]: binary parsing over any [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: bounded extraction of one selected subtitle entry
//!
//! The Central Directory is read from the end of the payload, so only the
//! chosen entry is ever decompressed. STORED and DEFLATE are supported;
//! encrypted entries, multi-disk archives and other methods are rejected.

mod extractor;
mod parser;
mod structures;

#[cfg(test)]
pub(crate) mod fixture;

pub use extractor::{ZipExtractor, extract_subtitle};
pub use parser::ZipParser;
pub use structures::*;
