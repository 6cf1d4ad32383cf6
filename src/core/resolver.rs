use crate::core::{MediaLink, SubtitleTrack};
use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Receives links as they are discovered. Push model: links arrive one at
/// a time in discovery order, before the resolution call returns.
pub trait LinkSink: Send {
    fn link(&mut self, link: MediaLink);

    /// Subtitle slot in the delivery contract. Default no-op; nothing in
    /// this crate emits subtitles.
    fn subtitle(&mut self, _track: SubtitleTrack) {}
}

/// Sink that gathers everything into vectors.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub links: Vec<MediaLink>,
    pub subtitles: Vec<SubtitleTrack>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkSink for CollectSink {
    fn link(&mut self, link: MediaLink) {
        self.links.push(link);
    }

    fn subtitle(&mut self, track: SubtitleTrack) {
        self.subtitles.push(track);
    }
}

#[async_trait]
pub trait Resolver: Send + Sync {
    fn name(&self) -> &str;
    fn suitable(&self, url: &Url) -> bool;
    async fn resolve(
        &self,
        url: &str,
        referer: Option<&str>,
        sink: &mut dyn LinkSink,
    ) -> Result<()>;
}

/// Registry of resolvers. Every suitable resolver gets a turn and their
/// output is concatenated; one resolver failing does not stop the rest.
pub struct ResolverEngine {
    pub resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverEngine {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    pub fn register_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    pub async fn resolve(&self, url: &str, referer: Option<&str>) -> Result<Vec<MediaLink>> {
        let parsed_url = Url::parse(url)?;

        let mut sink = CollectSink::new();
        let mut attempted = 0;
        for resolver in &self.resolvers {
            if !resolver.suitable(&parsed_url) {
                continue;
            }
            attempted += 1;
            if let Err(e) = resolver.resolve(url, referer, &mut sink).await {
                tracing::warn!("Resolver {} failed for {}: {}", resolver.name(), url, e);
            }
        }

        if attempted == 0 {
            anyhow::bail!("No suitable resolver found for URL: {}", url);
        }

        tracing::info!(
            "Resolved {} link(s) from {} via {} resolver(s)",
            sink.links.len(),
            url,
            attempted
        );
        Ok(sink.links)
    }
}

impl Default for ResolverEngine {
    fn default() -> Self {
        Self::new()
    }
}
