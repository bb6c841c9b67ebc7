//! scout-clients: reqwest-backed implementations of the scout-core
//! capability traits.
//!
//! - [`OpenRouterProvider`] — chat completions via the OpenRouter API
//! - [`SerpApiSearch`] — organic web search results via SerpAPI
//! - [`JinaReader`] — page text extraction via the Jina Reader proxy
//!
//! None of the clients retry; timeouts are set per client at construction
//! and are the only resilience mechanism the research loop relies on.

pub mod jina;
pub mod openrouter;
pub mod serpapi;

pub use jina::JinaReader;
pub use openrouter::OpenRouterProvider;
pub use serpapi::SerpApiSearch;
