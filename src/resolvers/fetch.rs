use crate::core::{ResolveError, USER_AGENT};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Result of a full page fetch. `final_url` is where the redirect chain
/// ended up, which is what relative URLs get resolved against.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub body: String,
}

/// Network capability the pipeline runs against. Redirects are always
/// followed; callers learn the terminal URL from the response.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<FetchedPage, ResolveError>;

    /// Header-only request; returns the final URL after redirects.
    async fn head(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, ResolveError>;
}

/// reqwest-backed fetcher used outside of tests.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64, max_redirects: usize) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    fn apply_headers(
        mut request: reqwest::RequestBuilder,
        headers: &HashMap<String, String>,
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(USER_AGENT, 30, 10)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<FetchedPage, ResolveError> {
        let request = Self::apply_headers(self.client.get(url), headers);
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ResolveError::Network(format!(
                "GET {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok(FetchedPage { final_url, body })
    }

    async fn head(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, ResolveError> {
        let request = Self::apply_headers(self.client.head(url), headers);
        let response = request.send().await?;
        Ok(response.url().to_string())
    }
}

/// Headers sent with page requests, identifying us as a browser arriving
/// from the given referer.
pub fn request_headers(referer: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
    headers.insert(
        "Accept".to_string(),
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
    );
    headers.insert("Accept-Language".to_string(), "en-US,en;q=0.5".to_string());
    headers.insert("Referer".to_string(), referer.to_string());
    headers
}
