mod http;
mod memory;

pub use http::{Fetch, HttpFetcher};
pub use memory::MemoryReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Fill `buf` with data starting at `offset`.
    ///
    /// Implementations must either fill the whole buffer or fail; archive
    /// parsing never retries short reads.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
