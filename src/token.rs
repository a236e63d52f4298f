//! Opaque proxy tokens.
//!
//! A token is the URL-safe base64 (unpadded) of a small JSON document naming
//! the upstream archive and the episode being asked for:
//!
//! ```text
//! {"originalUrl":"https://host/pack.zip","season":1,"episode":2}
//! ```
//!
//! The base64 alphabet never produces `.` or `/`, so a token is safe to embed
//! as the stem of `/subfile/<token>.srt`.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ProxyError, Result};

/// Path prefix the proxy route is mounted under.
pub const PROXY_PATH_PREFIX: &str = "/subfile/";

/// Extension every proxied subtitle is served under.
pub const PROXY_PATH_SUFFIX: &str = ".srt";

/// Unpadded on encode; tolerant of padding on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Everything needed to re-derive a subtitle from its archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyToken {
    pub original_url: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_positive"
    )]
    pub season: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_positive"
    )]
    pub episode: Option<u32>,
}

impl ProxyToken {
    /// Build a token, refusing URLs that would nest the proxy in itself.
    pub fn new(original_url: impl Into<String>, season: Option<u32>, episode: Option<u32>) -> Result<Self> {
        let token = Self {
            original_url: original_url.into(),
            season: season.filter(|s| *s > 0),
            episode: episode.filter(|e| *e > 0),
        };
        token.validate()?;
        Ok(token)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.original_url)
            .map_err(|e| ProxyError::MalformedToken(format!("invalid URL {}: {e}", self.original_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::MalformedToken(format!(
                "not an absolute http(s) URL: {}",
                self.original_url
            )));
        }
        if is_proxy_path(url.path()) {
            return Err(ProxyError::MalformedToken(format!(
                "refusing nested proxy URL: {}",
                self.original_url
            )));
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ProxyError::MalformedToken(format!("cannot serialize token: {e}")))?;
        Ok(TOKEN_ENGINE.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let raw = TOKEN_ENGINE
            .decode(token.trim())
            .map_err(|e| ProxyError::MalformedToken(format!("invalid base64: {e}")))?;
        let decoded: Self = serde_json::from_slice(&raw)
            .map_err(|e| ProxyError::MalformedToken(format!("invalid payload: {e}")))?;
        decoded.validate()?;
        Ok(decoded)
    }

    /// Relative proxy path, `/subfile/<token>.srt`.
    pub fn proxy_path(&self) -> Result<String> {
        Ok(format!("{PROXY_PATH_PREFIX}{}{PROXY_PATH_SUFFIX}", self.encode()?))
    }

    /// Decode the final path segment of a proxy URL (`<token>.srt`).
    ///
    /// Returns `None` when the segment does not have the proxy shape at all,
    /// so the caller can answer "not found" rather than a resolution error.
    pub fn from_file_name(file_name: &str) -> Option<Result<Self>> {
        let stem = file_name.strip_suffix(PROXY_PATH_SUFFIX)?;
        if stem.is_empty() || stem.contains(['.', '/']) {
            return None;
        }
        Some(Self::decode(stem))
    }
}

/// Whether `path` is exactly `/subfile/<token>.srt`.
fn is_proxy_path(path: &str) -> bool {
    path.strip_prefix(PROXY_PATH_PREFIX)
        .is_some_and(|file| ProxyToken::from_file_name(file).is_some())
}

/// Accept `3`, `"3"` or `null`; anything non-positive reads as absent.
fn lenient_positive<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    let parsed = match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<i64>().ok(),
    };
    Ok(parsed.filter(|n| *n > 0).and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_codec() {
        let cases = [
            ("https://feliratok.example/pack.zip", Some(1), Some(2)),
            ("https://host/dl.php?id=42&type=rar", None, None),
            ("http://host/Some Show – ünïcode.rar", Some(12), None),
        ];

        for (url, season, episode) in cases {
            let token = ProxyToken::new(url, season, episode).unwrap();
            let encoded = token.encode().unwrap();
            assert!(!encoded.contains(['.', '/', '=', '+']), "{encoded}");
            assert_eq!(ProxyToken::decode(&encoded).unwrap(), token);
        }
    }

    #[test]
    fn proxy_path_has_the_route_shape() {
        let token = ProxyToken::new("https://host/a.zip", Some(1), Some(1)).unwrap();
        let path = token.proxy_path().unwrap();
        assert!(path.starts_with("/subfile/"));
        assert!(path.ends_with(".srt"));

        let file = path.trim_start_matches(PROXY_PATH_PREFIX);
        assert_eq!(ProxyToken::from_file_name(file).unwrap().unwrap(), token);
    }

    #[test]
    fn accepts_padded_and_string_numbered_tokens() {
        let json = br#"{"originalUrl":"https://host/a.rar","season":"2","episode":"05"}"#;
        let padded = base64::engine::general_purpose::URL_SAFE.encode(json);

        let token = ProxyToken::decode(&padded).unwrap();
        assert_eq!(token.season, Some(2));
        assert_eq!(token.episode, Some(5));
    }

    #[test]
    fn non_positive_numbers_read_as_absent() {
        let json = br#"{"originalUrl":"https://host/a.rar","season":0,"episode":-3}"#;
        let token = ProxyToken::decode(&TOKEN_ENGINE.encode(json)).unwrap();
        assert_eq!(token.season, None);
        assert_eq!(token.episode, None);
    }

    #[test]
    fn rejects_malformed_tokens() {
        let bad = [
            "!!!not-base64!!!".to_string(),
            TOKEN_ENGINE.encode(b"not json"),
            TOKEN_ENGINE.encode(br#"{"season":1}"#),
            TOKEN_ENGINE.encode(br#"{"originalUrl":42}"#),
            TOKEN_ENGINE.encode(br#"{"originalUrl":"ftp://host/a.zip"}"#),
        ];

        for token in bad {
            assert!(matches!(ProxyToken::decode(&token), Err(ProxyError::MalformedToken(_))), "{token}");
        }
    }

    #[test]
    fn refuses_nested_proxy_urls() {
        let inner = ProxyToken::new("https://host/a.zip", None, None).unwrap();
        let nested = format!("https://proxy.example{}", inner.proxy_path().unwrap());
        assert!(matches!(ProxyToken::new(nested, None, None), Err(ProxyError::MalformedToken(_))));
    }

    #[test]
    fn upstream_urls_mentioning_subfile_are_not_nested() {
        let allowed = [
            "https://host/subfile/pack.zip",
            "https://host/subfile/",
            "https://host/dl.php?next=/subfile/abc.srt&type=zip",
            "https://host/mirror/subfile/abc.srt",
        ];
        for url in allowed {
            assert!(ProxyToken::new(url, Some(1), Some(1)).is_ok(), "{url}");
        }

        assert!(ProxyToken::new("https://host/subfile/abc.srt?x=1", None, None).is_err());
    }

    #[test]
    fn non_proxy_file_names_are_not_tokens() {
        assert!(ProxyToken::from_file_name("abc.vtt").is_none());
        assert!(ProxyToken::from_file_name(".srt").is_none());
        assert!(ProxyToken::from_file_name("a.b.srt").is_none());
        assert!(matches!(ProxyToken::from_file_name("abc.srt"), Some(Err(_))));
    }
}
