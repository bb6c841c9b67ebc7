//! Query planning: turns a topic into search queries and decides when the
//! loop has gathered enough evidence.

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::message::Message;
use crate::parse::{contains_done, parse_query_lines, DONE_SENTINEL};
use crate::provider::{CompletionProvider, CompletionRequest};

/// How many of the most recent digests are shown to the model when deciding
/// whether to continue. Bounds prompt size regardless of how much evidence
/// has accumulated.
pub const RECENCY_WINDOW: usize = 3;

const INITIAL_PROMPT: &str =
    "Generate 3-5 precise web search queries to research this topic. \
     Reply with one query per line.";

pub struct QueryPlanner {
    provider: Arc<dyn CompletionProvider>,
    recency_window: usize,
}

impl QueryPlanner {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            recency_window: RECENCY_WINDOW,
        }
    }

    pub fn with_recency_window(mut self, window: usize) -> Self {
        self.recency_window = window;
        self
    }

    /// Plan the opening set of search queries for a topic.
    ///
    /// The count is whatever the model returned after filtering; no hard
    /// bound is enforced here. Empty or unparseable text yields an empty
    /// Vec rather than an error so the run can fall through to a degenerate
    /// report. Transport and API failures propagate.
    pub async fn initial_queries(&self, topic: &str) -> Result<Vec<String>, Error> {
        let request = CompletionRequest::new(vec![
            Message::system(INITIAL_PROMPT),
            Message::user(topic),
        ]);

        let response = self.provider.complete(request).await?;
        let queries = parse_query_lines(&response.content);

        debug!(topic, count = queries.len(), "planned initial queries");
        Ok(queries)
    }

    /// Decide whether more searching is needed.
    ///
    /// Returns the empty Vec when the model's response contains the
    /// termination sentinel anywhere, regardless of any other text present.
    /// Otherwise the response is bullet-parsed into new queries.
    pub async fn next_queries(
        &self,
        topic: &str,
        existing: &[String],
        digests: &[String],
    ) -> Result<Vec<String>, Error> {
        let system = format!(
            "Analyze whether additional searches are needed to research the topic. \
             Respond with either:\n\
             - {DONE_SENTINEL} if no more searches are needed\n\
             - 2-3 new search queries as bullet points"
        );

        let recent = &digests[digests.len().saturating_sub(self.recency_window)..];
        let user = format!(
            "Original topic: {topic}\nExisting searches: {existing:?}\nRecent findings:\n{}",
            recent.join("\n")
        );

        let request =
            CompletionRequest::new(vec![Message::system(system), Message::user(user)]);
        let response = self.provider.complete(request).await?;

        if contains_done(&response.content) {
            debug!(topic, "planner signalled done");
            return Ok(Vec::new());
        }

        let queries = parse_query_lines(&response.content);
        debug!(topic, count = queries.len(), "planned follow-up queries");
        Ok(queries)
    }
}
