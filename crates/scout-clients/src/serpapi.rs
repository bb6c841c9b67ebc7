use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use scout_core::{Error, SearchProvider};

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SerpApiSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key: api_key.into(),
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

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
}

impl SearchResponse {
    fn links(self) -> Vec<String> {
        self.organic_results
            .into_iter()
            .filter_map(|r| r.link)
            .collect()
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, Error> {
        let num = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::auth("SerpAPI rejected the API key".to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), text));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::serialization(e.to_string()))?;

        let links = parsed.links();
        debug!(query, results = links.len(), "search complete");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organic_results() {
        let json = r#"{
            "organic_results": [
                {"position": 1, "link": "https://example.com/a", "title": "A"},
                {"position": 2, "title": "no link here"},
                {"position": 3, "link": "https://example.com/c"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let links = parsed.links();
        assert_eq!(links, vec!["https://example.com/a", "https://example.com/c"]);
    }

    #[test]
    fn test_parse_missing_organic_results() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"search_metadata": {}}"#).unwrap();
        assert!(parsed.links().is_empty());
    }
}
