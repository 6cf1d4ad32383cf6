use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Browser-style user agent used for both page requests and playback headers.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A playable media URL discovered on a source page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLink {
    pub source_name: String,
    pub display_name: String,
    pub url: String,
    pub kind: LinkKind,
    pub referer: String,
    pub quality: Quality,
    pub headers: HashMap<String, String>,
}

impl MediaLink {
    /// Build a link with quality and playback headers derived from the URL.
    /// Quality tagging and header assembly happen here and nowhere else.
    pub fn new(source_name: &str, display_name: &str, url: String, referer: &str) -> Self {
        let kind = LinkKind::from_url(&url);
        let quality = Quality::from_name(&url);
        Self {
            source_name: source_name.to_string(),
            display_name: display_name.to_string(),
            url,
            kind,
            referer: referer.to_string(),
            quality,
            headers: playback_headers(referer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    Video,
    Manifest,
}

impl LinkKind {
    pub fn from_url(url: &str) -> Self {
        if url.to_lowercase().contains(".m3u8") {
            LinkKind::Manifest
        } else {
            LinkKind::Video
        }
    }
}

/// Quality tier guessed from the URL or filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    Unknown,
    P240,
    P360,
    P480,
    P720,
    P1080,
}

impl Quality {
    /// Substring match, case-insensitive, first rule wins:
    /// 1080, 720/hd, 480/sd, 360, 240.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("1080") {
            Quality::P1080
        } else if lower.contains("720") || lower.contains("hd") {
            Quality::P720
        } else if lower.contains("480") || lower.contains("sd") {
            Quality::P480
        } else if lower.contains("360") {
            Quality::P360
        } else if lower.contains("240") {
            Quality::P240
        } else {
            Quality::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::P240 => "240p",
            Quality::Unknown => "unknown",
        }
    }
}

/// Subtitle record matching the delivery contract. No strategy in this
/// crate emits these; the sink slot exists for embedders that do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub language: String,
    pub format: String,
}

fn playback_headers(referer: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
    headers.insert("Accept".to_string(), "*/*".to_string());
    headers.insert(
        "Accept-Encoding".to_string(),
        "gzip, deflate, br".to_string(),
    );
    headers.insert("Referer".to_string(), referer.to_string());
    headers
}
