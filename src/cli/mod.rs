use crate::config::Config;
use crate::core::{LinkKind, ResolverEngine};
use crate::resolvers::{HttpFetcher, LinkResolver, ResolverOptions};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "vidresolve")]
#[command(about = "Resolve a source page URL into playable media links")]
#[command(version)]
pub struct Cli {
    /// Source page URL to resolve
    #[arg(value_name = "URL")]
    pub url: String,

    /// Referer to present; defaults to the page's own origin
    #[arg(short, long)]
    pub referer: Option<String>,

    /// Print discovered links as JSON
    #[arg(long)]
    pub json: bool,

    /// Return after the first direct match instead of probing mirrors
    #[arg(long)]
    pub stop_on_first: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if self.stop_on_first {
            config.stop_on_first_match = true;
        }

        let fetcher = Arc::new(HttpFetcher::new(
            &config.user_agent,
            config.timeout_secs,
            config.max_redirects,
        ));
        let options = ResolverOptions {
            stop_on_first_match: config.stop_on_first_match,
            ..Default::default()
        };

        let mut engine = ResolverEngine::new();
        engine.register_resolver(Box::new(LinkResolver::with_options(
            "Generic", fetcher, options,
        )));

        let links = engine.resolve(&self.url, self.referer.as_deref()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&links)?);
            return Ok(());
        }

        if links.is_empty() {
            println!("No playable links found for {}", self.url);
            return Ok(());
        }

        println!("Found {} link(s):", links.len());
        for (i, link) in links.iter().enumerate() {
            let kind = match link.kind {
                LinkKind::Video => "video",
                LinkKind::Manifest => "manifest",
            };
            println!(
                "  {}: {} [{}, {}] {}",
                i + 1,
                link.display_name,
                kind,
                link.quality.label(),
                link.url
            );
        }

        Ok(())
    }
}
