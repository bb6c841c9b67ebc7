//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Error;
use crate::provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, ContentProvider, SearchProvider,
};

/// A mock completion provider that returns pre-configured responses.
pub struct MockCompletion {
    responses: Mutex<Vec<Result<CompletionResponse, Error>>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response to be returned by the next complete() call.
    /// Responses are returned in FIFO order (first queued = first returned).
    pub fn queue_response(&self, content: &str) {
        self.responses.lock().unwrap().insert(
            0,
            Ok(CompletionResponse {
                content: content.to_string(),
                model: "mock-model".to_string(),
            }),
        );
    }

    /// Queue an error to be returned by the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> Option<&str> {
        None
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop() {
            Some(response) => response,
            None => Err(Error::Unknown("No mock response queued".to_string())),
        }
    }
}

/// A mock search provider backed by a query → URLs map.
pub struct MockSearch {
    results: Mutex<HashMap<String, Vec<String>>>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register the URLs returned for a query. Unregistered queries return
    /// an empty result set.
    pub fn insert(&self, query: &str, urls: Vec<String>) {
        self.results.lock().unwrap().insert(query.to_string(), urls);
    }

    /// Make every subsequent search call fail with the given message.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// The (query, limit) pairs seen so far, in call order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    fn name(&self) -> &str {
        "mock-search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit));
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::search(message));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

/// A mock content provider backed by a URL → text map.
/// Unregistered URLs behave like failed extractions and yield None.
pub struct MockContent {
    pages: Mutex<HashMap<String, String>>,
}

impl MockContent {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, url: &str, text: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), text.into());
    }
}

impl Default for MockContent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProvider for MockContent {
    fn name(&self) -> &str {
        "mock-content"
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        self.pages.lock().unwrap().get(url).cloned()
    }
}
