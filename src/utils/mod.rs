use url::Url;

/// Trim surrounding whitespace and percent-encode embedded spaces.
pub fn clean_url(url: &str) -> String {
    url.trim().replace(' ', "%20")
}

/// Whether the URL points at a media file or manifest, allowing a trailing
/// query string or fragment (`.mp4?token=...`, `.mp4#t=10`). Case-insensitive.
pub fn has_media_suffix(url: &str) -> bool {
    let lower = clean_url(url).to_lowercase();
    let path = lower
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(&lower);
    path.ends_with(".mp4") || path.ends_with(".m3u8")
}

/// Resolve a scraped `src` value to an absolute URL. Protocol-relative
/// values get an https scheme; relative paths are joined against the page
/// the value was found on.
pub fn absolutize(src: &str, base: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(clean_url(src));
    }
    if let Some(rest) = src.strip_prefix("//") {
        return Some(clean_url(&format!("https://{}", rest)));
    }
    let base_url = Url::parse(base).ok()?;
    let joined = base_url.join(src).ok()?;
    Some(clean_url(joined.as_ref()))
}

/// Origin of a URL (`scheme://host`), used as the fallback referer.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url("  https://a.com/my video.mp4 "),
            "https://a.com/my%20video.mp4"
        );
    }

    #[test]
    fn test_has_media_suffix() {
        assert!(has_media_suffix("https://a.com/v.mp4"));
        assert!(has_media_suffix("https://a.com/v.MP4?token=1&e=2"));
        assert!(has_media_suffix("https://a.com/v.mp4#t=10"));
        assert!(has_media_suffix("https://a.com/master.m3u8?a=1#frag"));
        assert!(has_media_suffix("https://a.com/master.m3u8"));
        assert!(!has_media_suffix("https://a.com/watch?id=v.mp4.html"));
        assert!(!has_media_suffix("https://a.com/page"));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("//cdn.example.com/v.mp4", "https://site.com/ep/1"),
            Some("https://cdn.example.com/v.mp4".to_string())
        );
        assert_eq!(
            absolutize("/v.mp4", "https://site.com/ep/1"),
            Some("https://site.com/v.mp4".to_string())
        );
        assert_eq!(
            absolutize("https://a.com/v.mp4", "https://site.com"),
            Some("https://a.com/v.mp4".to_string())
        );
        assert_eq!(absolutize("   ", "https://site.com"), None);
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://site.com/ep/1?x=1"),
            Some("https://site.com".to_string())
        );
        assert_eq!(
            origin_of("http://site.com:8080/a"),
            Some("http://site.com:8080".to_string())
        );
        assert_eq!(origin_of("not a url"), None);
    }
}
