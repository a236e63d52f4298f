//! Payload classification and subtitle entry selection.
//!
//! Both halves are pure: [`detect`] looks at magic bytes (and the source URL as
//! a fallback), [`select_subtitle`] picks one entry name out of an archive
//! listing using season/episode hints.

/// ZIP local file header magic, first two bytes are enough.
const ZIP_MAGIC: &[u8] = b"PK";

/// RAR 4.x and 5.x share this six byte prefix.
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";

/// Subtitle extensions accepted from inside an archive.
const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".sub", ".ass", ".ssa", ".vtt"];

/// Kind of payload behind a proxied URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    Zip,
    Rar,
    /// Not an archive; served as a raw subtitle.
    Text,
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Zip => "ZIP",
            ArchiveType::Rar => "RAR",
            ArchiveType::Text => "text",
        }
    }
}

/// Classify a payload by signature, falling back to the URL suffix.
pub fn detect(data: &[u8], source_url: &str) -> ArchiveType {
    let head = &data[..data.len().min(8)];

    if head.starts_with(ZIP_MAGIC) {
        return ArchiveType::Zip;
    }
    if head.starts_with(RAR_MAGIC) {
        return ArchiveType::Rar;
    }

    if has_archive_suffix(source_url, "zip") {
        ArchiveType::Zip
    } else if has_archive_suffix(source_url, "rar") {
        ArchiveType::Rar
    } else {
        ArchiveType::Text
    }
}

/// Whether `url` carries `.{ext}` right before its end, a `?` or a `&`.
///
/// Matching is ASCII case-insensitive, so `Pack.ZIP?dl=1` counts as a zip.
pub fn has_archive_suffix(url: &str, ext: &str) -> bool {
    let url = url.to_ascii_lowercase();
    let needle = format!(".{}", ext.to_ascii_lowercase());

    url.match_indices(&needle).any(|(idx, _)| {
        matches!(
            url.as_bytes().get(idx + needle.len()),
            None | Some(b'?') | Some(b'&')
        )
    })
}

/// Whether `url` points at a ZIP or RAR archive by suffix.
pub fn is_archive_url(url: &str) -> bool {
    has_archive_suffix(url, "zip") || has_archive_suffix(url, "rar")
}

fn is_subtitle_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SUBTITLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Release-name patterns for one episode, strongest first.
fn episode_patterns(season: Option<u32>, episode: Option<u32>) -> Vec<String> {
    match (season, episode) {
        (Some(s), Some(e)) => vec![
            format!("s{s:02}e{e:02}"),
            format!("{s}x{e:02}"),
            format!("{s}x{e}"),
        ],
        _ => Vec::new(),
    }
}

/// Pick the subtitle entry to serve from an archive listing.
///
/// Entries without a subtitle extension are ignored. With both hints present,
/// each pattern is tried across the whole listing before the next, weaker one.
/// Without a pattern hit the first subtitle entry in listing order wins.
pub fn select_subtitle<S: AsRef<str>>(
    names: &[S],
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<&str> {
    let candidates: Vec<&str> = names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| is_subtitle_file(name))
        .collect();

    let first = *candidates.first()?;

    for pattern in episode_patterns(season, episode) {
        if let Some(hit) = candidates
            .iter()
            .find(|name| name.to_ascii_lowercase().contains(&pattern))
        {
            return Some(*hit);
        }
    }

    Some(first)
}
