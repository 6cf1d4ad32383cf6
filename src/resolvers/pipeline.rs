use crate::core::{LinkSink, MediaLink, ResolveError, Resolver};
use crate::resolvers::fetch::{request_headers, FetchedPage, PageFetcher};
use crate::utils::{absolutize, clean_url, has_media_suffix, origin_of};
use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Tuning knobs for [`LinkResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// When true, a direct-suffix hit returns immediately instead of
    /// probing mirrors and scripts for additional sources.
    pub stop_on_first_match: bool,
    /// Canonical origin used as the referer when the caller supplies none.
    /// Falls back to the page URL's own origin.
    pub origin: Option<String>,
    /// URLs matching this but not `terminal_pattern` are intermediate
    /// download pages and get one extra HEAD pass before emission.
    pub intermediate_pattern: Option<String>,
    /// Terminal streaming-node hosts; a redirect landing here is final.
    pub terminal_pattern: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            stop_on_first_match: false,
            origin: None,
            intermediate_pattern: Some(r"archive\.org/download/".to_string()),
            terminal_pattern: Some(r"ia\d+\.archive\.org".to_string()),
        }
    }
}

/// A media URL found on the page, waiting to be normalized and emitted.
struct Candidate {
    url: String,
    label: String,
}

/// Per-call state. Dropped when the resolution call returns.
struct ResolutionContext {
    page_url: String,
    referer: String,
    headers: HashMap<String, String>,
    seen: HashSet<String>,
}

/// Ordered heuristic chain turning a page URL into playable media links:
/// direct suffix match, HEAD redirect resolution, player-markup scraping,
/// base64 mirror decoding, inline-script scanning. Every strategy is
/// fault-isolated; an empty result is not an error.
pub struct LinkResolver {
    name: String,
    fetcher: Arc<dyn PageFetcher>,
    options: ResolverOptions,
    intermediate: Option<Regex>,
    terminal: Option<Regex>,
}

impl LinkResolver {
    pub fn new(name: &str, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_options(name, fetcher, ResolverOptions::default())
    }

    pub fn with_options(
        name: &str,
        fetcher: Arc<dyn PageFetcher>,
        options: ResolverOptions,
    ) -> Self {
        let intermediate = compile_pattern(options.intermediate_pattern.as_deref());
        let terminal = compile_pattern(options.terminal_pattern.as_deref());
        Self {
            name: name.to_string(),
            fetcher,
            options,
            intermediate,
            terminal,
        }
    }

    fn is_intermediate(&self, url: &str) -> bool {
        match (&self.intermediate, &self.terminal) {
            (Some(intermediate), Some(terminal)) => {
                intermediate.is_match(url) && !terminal.is_match(url)
            }
            (Some(intermediate), None) => intermediate.is_match(url),
            _ => false,
        }
    }

    /// Header-only probe of the page URL itself; emits when the redirect
    /// chain lands on a media file.
    async fn head_redirect(
        &self,
        ctx: &mut ResolutionContext,
        sink: &mut dyn LinkSink,
    ) -> Result<(), ResolveError> {
        let final_url = self.fetcher.head(&ctx.page_url, &ctx.headers).await?;
        if final_url != ctx.page_url && has_media_suffix(&final_url) {
            tracing::debug!("HEAD resolved {} -> {}", ctx.page_url, final_url);
            self.emit(ctx, sink, final_url, "Direct").await;
        }
        Ok(())
    }

    /// Synchronous scrape of a fetched page: player markup, mirror
    /// options, inline scripts, in that order.
    fn scrape_candidates(&self, page: &FetchedPage) -> Vec<Candidate> {
        let document = Html::parse_document(&page.body);
        let mut candidates = Vec::new();

        // Player markup: video/source src with data-src fallback
        collect_media_sources(&document.root_element(), &page.final_url, "Direct", &mut candidates);

        // Download anchors, as found on archive.org file listings
        let anchor_selector = Selector::parse("a[href]").unwrap();
        for anchor in document.select(&anchor_selector) {
            let href = anchor.value().attr("href").unwrap_or("");
            if let Some(abs) = absolutize(href, &page.final_url) {
                if has_media_suffix(&abs) || self.is_intermediate(&abs) {
                    let text = anchor.text().collect::<String>().trim().to_string();
                    let label = if text.is_empty() {
                        "Video".to_string()
                    } else {
                        text
                    };
                    candidates.push(Candidate { url: abs, label });
                }
            }
        }

        // Mirror options carrying base64-encoded player fragments
        let mirror_selector = Selector::parse("select.mirror option, .mobius option").unwrap();
        for option in document.select(&mirror_selector) {
            let value = option.value().attr("value").unwrap_or("").trim();
            if value.is_empty() {
                continue;
            }
            let label = option.text().collect::<String>().trim().to_string();
            match self.decode_mirror(value, &page.final_url) {
                Ok(urls) => {
                    for url in urls {
                        candidates.push(Candidate {
                            url,
                            label: label.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::debug!("Mirror decode failed for '{}': {}", label, e);
                    // Not base64 after all; some sites put the URL in plain
                    if value.starts_with("http") {
                        candidates.push(Candidate {
                            url: clean_url(value),
                            label,
                        });
                    }
                }
            }
        }

        // Inline scripts
        let script_selector = Selector::parse("script").unwrap();
        for script in document.select(&script_selector) {
            let content = script.text().collect::<String>();
            for url in self.scan_script(&content, &page.final_url) {
                candidates.push(Candidate {
                    url,
                    label: "Script".to_string(),
                });
            }
        }

        candidates
    }

    /// Decode a mirror option value as base64 HTML and scrape the fragment
    /// the same way as the host page. Iframe embeds count when they look
    /// like media or an intermediate download page.
    fn decode_mirror(&self, value: &str, base: &str) -> Result<Vec<String>, ResolveError> {
        let bytes = BASE64.decode(value)?;
        let html = String::from_utf8(bytes).map_err(|e| ResolveError::Decode(e.to_string()))?;

        let fragment = Html::parse_document(&html);
        let mut candidates = Vec::new();
        collect_media_sources(&fragment.root_element(), base, "", &mut candidates);
        let mut urls: Vec<String> = candidates.into_iter().map(|c| c.url).collect();

        let iframe_selector = Selector::parse("iframe").unwrap();
        for frame in fragment.select(&iframe_selector) {
            let src = frame
                .value()
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| frame.value().attr("data-src"));
            if let Some(src) = src {
                if let Some(abs) = absolutize(src, base) {
                    if has_media_suffix(&abs) || self.is_intermediate(&abs) {
                        urls.push(abs);
                    }
                }
            }
        }

        Ok(urls)
    }

    /// Regex scan of one script body. Patterns are ordered from most to
    /// least specific; matches are filtered down to media-looking URLs.
    fn scan_script(&self, content: &str, base: &str) -> Vec<String> {
        let patterns = [
            // Provider download paths
            r#"["'](https?://[^"'\s]+/download/[^"'\s]+)["']"#,
            // fetch("...") calls
            r#"fetch\(\s*["']([^"']+)["']"#,
            // "file": "..." player configs
            r#""file"\s*:\s*"([^"]+)""#,
            // Any absolute media URL
            r#"(https?://[^"'\s<>]+\.(?:mp4|m3u8)[^"'\s<>]*)"#,
        ];

        let mut found = Vec::new();
        for pattern in &patterns {
            if let Ok(re) = Regex::new(pattern) {
                for captures in re.captures_iter(content) {
                    if let Some(m) = captures.get(1) {
                        if let Some(abs) = absolutize(m.as_str(), base) {
                            if has_media_suffix(&abs) || self.is_intermediate(&abs) {
                                found.push(abs);
                            }
                        }
                    }
                }
            }
        }
        found
    }

    /// Intermediate download-page URLs get one extra HEAD resolution pass.
    /// On failure the original URL is kept rather than dropped.
    async fn normalize_nested(&self, url: &str, ctx: &ResolutionContext) -> String {
        if !self.is_intermediate(url) {
            return url.to_string();
        }
        let Some(terminal) = &self.terminal else {
            return url.to_string();
        };
        match self.fetcher.head(url, &ctx.headers).await {
            Ok(final_url) if terminal.is_match(&final_url) => {
                tracing::debug!("Resolved intermediate {} -> {}", url, final_url);
                final_url
            }
            Ok(_) => url.to_string(),
            Err(e) => {
                tracing::debug!("Nested redirect resolution failed for {}: {}", url, e);
                url.to_string()
            }
        }
    }

    /// Normalize, deduplicate, wrap and push one candidate. Quality and
    /// playback headers are derived inside `MediaLink::new`.
    async fn emit(
        &self,
        ctx: &mut ResolutionContext,
        sink: &mut dyn LinkSink,
        url: String,
        label: &str,
    ) {
        let url = clean_url(&url);
        if url.is_empty() || ctx.seen.contains(&url) {
            return;
        }
        let final_url = self.normalize_nested(&url, ctx).await;
        if final_url != url {
            // Remember the pre-resolution URL so other strategies finding
            // the same intermediate page do not trigger another HEAD pass.
            ctx.seen.insert(url);
        }
        if !ctx.seen.insert(final_url.clone()) {
            tracing::debug!("Skipping duplicate link {}", final_url);
            return;
        }

        let display_name = if label.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", label, self.name)
        };
        sink.link(MediaLink::new(
            &self.name,
            &display_name,
            final_url,
            &ctx.referer,
        ));
    }
}

#[async_trait]
impl Resolver for LinkResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn suitable(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    async fn resolve(
        &self,
        url: &str,
        referer: Option<&str>,
        sink: &mut dyn LinkSink,
    ) -> Result<()> {
        let page_url = clean_url(url);
        let referer = referer
            .map(str::to_string)
            .or_else(|| self.options.origin.clone())
            .or_else(|| origin_of(&page_url))
            .unwrap_or_else(|| page_url.clone());
        let headers = request_headers(&referer);
        let mut ctx = ResolutionContext {
            page_url,
            referer,
            headers,
            seen: HashSet::new(),
        };

        // 1. Direct suffix shortcut
        if has_media_suffix(&ctx.page_url) {
            let direct = ctx.page_url.clone();
            self.emit(&mut ctx, sink, direct, "Direct").await;
            if self.options.stop_on_first_match {
                return Ok(());
            }
        }

        // 2. HEAD redirect resolution
        if let Err(e) = self.head_redirect(&mut ctx, sink).await {
            tracing::warn!("HEAD probe failed for {}: {}", ctx.page_url, e);
        }

        // 3-5. Fetch the page once; scrape markup, mirrors and scripts
        let page_url = ctx.page_url.clone();
        match self.fetcher.get(&page_url, &ctx.headers).await {
            Ok(page) => {
                let candidates = self.scrape_candidates(&page);
                tracing::debug!("{} candidate(s) scraped from {}", candidates.len(), page_url);
                for candidate in candidates {
                    self.emit(&mut ctx, sink, candidate.url, &candidate.label)
                        .await;
                }
            }
            Err(e) => {
                tracing::warn!("Page fetch failed for {}: {}", page_url, e);
            }
        }

        Ok(())
    }
}

fn compile_pattern(pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern?;
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Ignoring invalid URL pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Pull src/data-src out of video and source elements under `root`.
fn collect_media_sources(
    root: &scraper::ElementRef<'_>,
    base: &str,
    label: &str,
    out: &mut Vec<Candidate>,
) {
    let media_selector = Selector::parse("video, source").unwrap();
    for element in root.select(&media_selector) {
        let src = element
            .value()
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| element.value().attr("data-src"));
        if let Some(src) = src {
            if let Some(abs) = absolutize(src, base) {
                out.push(Candidate {
                    url: abs,
                    label: label.to_string(),
                });
            }
        }
    }
}
