//! Evidence collection: fan out over a query's top search results and
//! condense each page into an evidence note.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;
use crate::message::Message;
use crate::parse::truncate_chars;
use crate::provider::{CompletionProvider, CompletionRequest, ContentProvider, SearchProvider};

/// How many result URLs to request from the search provider.
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// How many of those URLs are actually fetched and analyzed per query.
pub const URLS_PER_QUERY: usize = 3;

/// Page content is truncated to this many characters before condensation.
pub const CONTENT_PREFIX_CHARS: usize = 5000;

/// One condensed, query-relevant summary of a single page.
/// Created once per successfully analyzed URL and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceNote {
    pub origin_query: String,
    pub source_url: String,
    pub digest: String,
}

pub struct EvidenceCollector {
    provider: Arc<dyn CompletionProvider>,
    search: Arc<dyn SearchProvider>,
    content: Arc<dyn ContentProvider>,
}

impl EvidenceCollector {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            provider,
            search,
            content,
        }
    }

    /// Collect evidence for a single query.
    ///
    /// Returns between 0 and [`URLS_PER_QUERY`] notes. The URLs are processed
    /// independently and concurrently; a fetch or condensation failure for one
    /// URL is absorbed (logged, no note) and never blocks the others. Only a
    /// failure of the search call itself propagates.
    pub async fn collect(&self, query: &str) -> Result<Vec<EvidenceNote>, Error> {
        let urls = self.search.search(query, SEARCH_RESULT_LIMIT).await?;
        debug!(query, urls = urls.len(), "search returned");

        let tasks = urls
            .into_iter()
            .take(URLS_PER_QUERY)
            .map(|url| self.analyze_url(query, url));

        let notes: Vec<EvidenceNote> = join_all(tasks).await.into_iter().flatten().collect();
        debug!(query, notes = notes.len(), "collected evidence");
        Ok(notes)
    }

    /// Fetch one URL and condense its content into a note.
    /// Any failure along the way yields None.
    async fn analyze_url(&self, query: &str, url: String) -> Option<EvidenceNote> {
        let content = match self.content.fetch(&url).await {
            Some(text) => text,
            None => {
                debug!(query, url, "no content extracted, skipping");
                return None;
            }
        };

        let prefix = truncate_chars(&content, CONTENT_PREFIX_CHARS);
        let request = CompletionRequest::new(vec![
            Message::system(format!(
                "Extract relevant insights about {query} from this content. \
                 Focus on key facts and data points."
            )),
            Message::user(format!("Content from {url}:\n\n{prefix}")),
        ]);

        match self.provider.complete(request).await {
            Ok(response) => Some(EvidenceNote {
                origin_query: query.to_string(),
                source_url: url,
                digest: response.content,
            }),
            Err(e) => {
                warn!(query, url, error = %e, "condensation failed, skipping source");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompletion, MockContent, MockSearch};

    fn collector(
        provider: Arc<MockCompletion>,
        search: Arc<MockSearch>,
        content: Arc<MockContent>,
    ) -> EvidenceCollector {
        EvidenceCollector::new(provider, search, content)
    }

    #[tokio::test]
    async fn test_collect_caps_at_three_urls() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());

        let urls: Vec<String> = (1..=5).map(|i| format!("https://e.com/{i}")).collect();
        search.insert("q", urls.clone());
        for url in &urls {
            content.insert(url, "page text");
        }
        for _ in 0..3 {
            provider.queue_response("digest");
        }

        let notes = collector(provider, search, content)
            .collect("q")
            .await
            .unwrap();
        assert_eq!(notes.len(), 3);
    }

    #[tokio::test]
    async fn test_collect_skips_failed_fetch_without_error() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());

        search.insert(
            "q",
            vec![
                "https://e.com/1".to_string(),
                "https://e.com/dead".to_string(),
                "https://e.com/3".to_string(),
            ],
        );
        content.insert("https://e.com/1", "text one");
        content.insert("https://e.com/3", "text three");
        provider.queue_response("digest one");
        provider.queue_response("digest three");

        let notes = collector(provider, search, content)
            .collect("q")
            .await
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.source_url != "https://e.com/dead"));
    }

    #[tokio::test]
    async fn test_collect_absorbs_condensation_failure() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());

        search.insert(
            "q",
            vec!["https://e.com/1".to_string(), "https://e.com/2".to_string()],
        );
        content.insert("https://e.com/1", "text");
        content.insert("https://e.com/2", "text");
        provider.queue_response("good digest");
        provider.queue_error(Error::api(500, "model overloaded"));

        let notes = collector(provider, search, content)
            .collect("q")
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].digest, "good digest");
    }

    #[tokio::test]
    async fn test_collect_empty_search_yields_no_notes() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());
        search.insert("q", Vec::new());

        let notes = collector(provider, search, content)
            .collect("q")
            .await
            .unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_collect_propagates_search_failure() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());
        search.fail_with("quota exhausted");

        let err = collector(provider, search, content)
            .collect("q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_collect_truncates_content_before_condensation() {
        let provider = Arc::new(MockCompletion::new());
        let search = Arc::new(MockSearch::new());
        let content = Arc::new(MockContent::new());

        search.insert("q", vec!["https://e.com/long".to_string()]);
        content.insert("https://e.com/long", "x".repeat(20_000));
        provider.queue_response("digest");

        collector(provider.clone(), search, content)
            .collect("q")
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        let user = &request.messages[1].content;
        assert!(user.len() < CONTENT_PREFIX_CHARS + 200);
    }
}
