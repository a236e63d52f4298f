use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;

use super::ReadAt;

/// Random access over a fully downloaded payload.
pub struct MemoryReader {
    data: Bytes,
}

impl MemoryReader {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let end = offset.checked_add(buf.len() as u64);
        match end {
            Some(end) if end <= self.size() => {
                let start = offset as usize;
                buf.copy_from_slice(&self.data[start..end as usize]);
                Ok(buf.len())
            }
            _ => bail!(
                "Read of {} bytes at offset {} runs past end of archive ({} bytes)",
                buf.len(),
                offset,
                self.size()
            ),
        }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
