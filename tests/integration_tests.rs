use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use vidresolve::config::Config;
use vidresolve::core::{CollectSink, LinkKind, MediaLink, Quality, ResolveError, Resolver, ResolverEngine};
use vidresolve::resolvers::{FetchedPage, LinkResolver, PageFetcher};

/// Canned fetcher so the whole pipeline runs without touching the network.
struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
    heads: HashMap<String, String>,
}

impl StaticFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            heads: HashMap::new(),
        }
    }

    fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                final_url: url.to_string(),
                body: body.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn get(
        &self,
        url: &str,
        _headers: &HashMap<String, String>,
    ) -> std::result::Result<FetchedPage, ResolveError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::Network(format!("no page for {}", url)))
    }

    async fn head(
        &self,
        url: &str,
        _headers: &HashMap<String, String>,
    ) -> std::result::Result<String, ResolveError> {
        self.heads
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::Network(format!("no HEAD for {}", url)))
    }
}

#[tokio::test]
async fn test_resolver_engine_initialization() -> Result<()> {
    let mut engine = ResolverEngine::new();
    engine.register_resolver(Box::new(LinkResolver::new(
        "Generic",
        Arc::new(StaticFetcher::new()),
    )));

    assert!(engine.resolvers.len() > 0);
    Ok(())
}

#[tokio::test]
async fn test_link_resolver_suitable() -> Result<()> {
    let resolver = LinkResolver::new("Generic", Arc::new(StaticFetcher::new()));

    assert!(resolver.suitable(&Url::parse("https://example.com/ep/1")?));
    assert!(resolver.suitable(&Url::parse("http://example.com/v.mp4")?));
    assert!(!resolver.suitable(&Url::parse("ftp://example.com/v.mp4")?));

    Ok(())
}

#[tokio::test]
async fn test_engine_rejects_unparseable_url() -> Result<()> {
    let mut engine = ResolverEngine::new();
    engine.register_resolver(Box::new(LinkResolver::new(
        "Generic",
        Arc::new(StaticFetcher::new()),
    )));

    assert!(engine.resolve("not a url", None).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_engine_errors_when_nothing_suitable() -> Result<()> {
    let mut engine = ResolverEngine::new();
    engine.register_resolver(Box::new(LinkResolver::new(
        "Generic",
        Arc::new(StaticFetcher::new()),
    )));

    assert!(engine.resolve("ftp://example.com/v.mp4", None).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_engine_resolves_page_end_to_end() -> Result<()> {
    let fetcher = StaticFetcher::new().page(
        "https://site.com/ep/1",
        r#"
            <video src="//cdn.site.com/ep-1080.mp4"></video>
            <script>var fallback = "https://cdn2.site.com/ep-360.mp4";</script>
        "#,
    );

    let mut engine = ResolverEngine::new();
    engine.register_resolver(Box::new(LinkResolver::new("Generic", Arc::new(fetcher))));

    let links = engine.resolve("https://site.com/ep/1", None).await?;
    assert_eq!(links.len(), 2);

    // Discovery order: player markup before scripts
    assert_eq!(links[0].url, "https://cdn.site.com/ep-1080.mp4");
    assert_eq!(links[0].quality, Quality::P1080);
    assert_eq!(links[1].url, "https://cdn2.site.com/ep-360.mp4");
    assert_eq!(links[1].quality, Quality::P360);

    Ok(())
}

#[tokio::test]
async fn test_explicit_referer_is_carried_on_links() -> Result<()> {
    let fetcher = StaticFetcher::new();
    let mut engine = ResolverEngine::new();
    engine.register_resolver(Box::new(LinkResolver::new("Generic", Arc::new(fetcher))));

    let links = engine
        .resolve("https://cdn.site.com/v.mp4", Some("https://portal.example"))
        .await?;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].referer, "https://portal.example");
    assert_eq!(
        links[0].headers.get("Referer").map(String::as_str),
        Some("https://portal.example")
    );

    Ok(())
}

#[tokio::test]
async fn test_media_link_json_round_trip() -> Result<()> {
    let link = MediaLink::new(
        "Generic",
        "Mirror A - Generic",
        "https://cdn.site.com/ep-720.m3u8".to_string(),
        "https://site.com",
    );

    let json = serde_json::to_string(&link)?;
    let parsed: MediaLink = serde_json::from_str(&json)?;

    assert_eq!(parsed.url, link.url);
    assert_eq!(parsed.kind, LinkKind::Manifest);
    assert_eq!(parsed.quality, Quality::P720);
    Ok(())
}

#[tokio::test]
async fn test_collect_sink_preserves_insertion_order() -> Result<()> {
    use vidresolve::core::LinkSink;

    let mut sink = CollectSink::new();
    for n in 0..3 {
        sink.link(MediaLink::new(
            "Generic",
            "Generic",
            format!("https://cdn.site.com/part-{}.mp4", n),
            "https://site.com",
        ));
    }

    let urls: Vec<&str> = sink.links.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://cdn.site.com/part-0.mp4",
            "https://cdn.site.com/part-1.mp4",
            "https://cdn.site.com/part-2.mp4",
        ]
    );
    assert!(sink.subtitles.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_config_defaults() -> Result<()> {
    let config = Config::load(None)?;
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.max_redirects, 10);
    assert!(!config.stop_on_first_match);
    Ok(())
}
