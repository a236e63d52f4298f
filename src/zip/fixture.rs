//! In-memory ZIP builder for tests.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;

struct FixtureEntry {
    name: String,
    payload: Vec<u8>,
    method: u16,
    crc32: u32,
    uncompressed_size: u32,
}

#[derive(Default)]
pub(crate) struct ZipFixture {
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
}

impl ZipFixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stored(self, name: &str, data: &[u8]) -> Self {
        self.with_method(name, data, 0)
    }

    pub(crate) fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.deflated_claiming(name, data, data.len() as u32)
    }

    /// Deflate `data` but record `claimed` as its uncompressed size.
    pub(crate) fn deflated_claiming(mut self, name: &str, data: &[u8], claimed: u32) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        self.entries.push(FixtureEntry {
            name: name.to_string(),
            payload: encoder.finish().unwrap(),
            method: 8,
            crc32: crc32fast::hash(data),
            uncompressed_size: claimed,
        });
        self
    }

    /// Store `data` verbatim under an arbitrary method id.
    pub(crate) fn with_method(mut self, name: &str, data: &[u8], method: u16) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_string(),
            payload: data.to_vec(),
            method,
            crc32: crc32fast::hash(data),
            uncompressed_size: data.len() as u32,
        });
        self
    }

    pub(crate) fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let offset = out.len() as u32;
            let name = entry.name.as_bytes();

            out.extend_from_slice(b"PK\x03\x04");
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&[0u8; 4]);
            out.extend_from_slice(&entry.crc32.to_le_bytes());
            out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name);
            out.extend_from_slice(&entry.payload);

            central.extend_from_slice(b"PK\x01\x02");
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&entry.method.to_le_bytes());
            central.extend_from_slice(&[0u8; 4]);
            central.extend_from_slice(&entry.crc32.to_le_bytes());
            central.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0u8; 8]);
            central.extend_from_slice(&0u32.to_le_bytes());
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name);
        }

        let cd_offset = out.len() as u32;
        let count = self.entries.len() as u16;
        out.extend_from_slice(&central);

        out.extend_from_slice(b"PK\x05\x06");
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }
}
