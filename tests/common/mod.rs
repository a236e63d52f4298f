#![allow(dead_code)]

use std::time::Duration;

use subfile_proxy::{ArchiveResolver, ProxyConfig};

#[path = "../../src/zip/fixture.rs"]
mod zip_fixture;

pub(crate) use zip_fixture::ZipFixture;

pub fn test_config() -> ProxyConfig {
    ProxyConfig {
        max_subtitle_bytes: 1024,
        max_download_bytes: 64 * 1024,
        fetch_timeout: Duration::from_secs(5),
        ..ProxyConfig::default()
    }
}

pub fn test_resolver() -> ArchiveResolver {
    ArchiveResolver::from_config(&test_config()).unwrap()
}
