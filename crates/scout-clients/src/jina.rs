use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use scout_core::ContentProvider;

const DEFAULT_BASE_URL: &str = "https://r.jina.ai";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Page text extraction via the Jina Reader proxy.
///
/// Per the `ContentProvider` contract this client never surfaces an error:
/// transport failures, non-success statuses, and unreadable bodies all
/// collapse to None, logged at debug level. An API key is optional; the
/// reader works unauthenticated at a lower rate limit.
pub struct JinaReader {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl JinaReader {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("deepscout/0.1.0")
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl ContentProvider for JinaReader {
    fn name(&self) -> &str {
        "jina"
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        let mut request = self.client.get(format!("{}/{}", self.base_url, url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "content fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "content fetch rejected");
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(url, error = %e, "content body unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_url_construction() {
        let reader = JinaReader::new(None).with_base_url("https://proxy.local");
        assert_eq!(
            format!("{}/{}", reader.base_url, "https://example.com/page"),
            "https://proxy.local/https://example.com/page"
        );
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_yields_none() {
        // Port 9 (discard) on localhost is not listening; the transport
        // error must collapse to None, never panic or surface.
        let reader = JinaReader::new(None)
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(200));
        assert!(reader.fetch("https://example.com").await.is_none());
    }
}
