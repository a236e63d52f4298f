use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    DEFAULT_MAX_DOWNLOAD_BYTES, DEFAULT_MAX_SUBTITLE_BYTES, ProxyConfig, positive_or,
};

#[derive(Parser, Debug)]
#[command(name = "subfile-proxy")]
#[command(version)]
#[command(about = "Serve subtitles out of remote ZIP/RAR archives on demand", long_about = None)]
#[command(after_help = "Examples:\n  \
  subfile-proxy                          listen on 0.0.0.0:7000 with one extraction slot\n  \
  subfile-proxy --port 8080 -c 4         four simultaneous extractions\n  \
  PORT=7001 LOG_JSON=1 subfile-proxy     configure through the environment")]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short = 'p', long, env = "PORT", default_value_t = 7000)]
    pub port: u16,

    /// Simultaneous extractions (0 or less: unbounded)
    #[arg(short = 'c', long, env = "ARCHIVE_EXTRACT_CONCURRENCY", default_value_t = 1, allow_negative_numbers = true)]
    pub extract_concurrency: i64,

    /// Cap on an extracted subtitle, in bytes
    #[arg(long, env = "SUBTITLE_MAX_BYTES", default_value_t = DEFAULT_MAX_SUBTITLE_BYTES)]
    pub max_subtitle_bytes: u64,

    /// Cap on a raw archive download, in bytes
    #[arg(long, env = "ARCHIVE_MAX_DOWNLOAD_BYTES", default_value_t = DEFAULT_MAX_DOWNLOAD_BYTES)]
    pub max_download_bytes: u64,

    /// Network timeout for a single download, in seconds
    #[arg(long, env = "ARCHIVE_FETCH_TIMEOUT_SECS", default_value_t = 45)]
    pub fetch_timeout_secs: u64,

    /// Directory for transient download files (default: system temp dir)
    #[arg(long, env = "ARCHIVE_TEMP_DIR", value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    pub fn proxy_config(&self) -> ProxyConfig {
        let defaults = ProxyConfig::default();
        ProxyConfig {
            extraction_concurrency: usize::try_from(self.extract_concurrency).unwrap_or(0),
            max_subtitle_bytes: positive_or(self.max_subtitle_bytes, DEFAULT_MAX_SUBTITLE_BYTES),
            max_download_bytes: positive_or(self.max_download_bytes, DEFAULT_MAX_DOWNLOAD_BYTES),
            fetch_timeout: match self.fetch_timeout_secs {
                0 => defaults.fetch_timeout,
                secs => Duration::from_secs(secs),
            },
            temp_dir: self.temp_dir.clone(),
        }
    }
}
