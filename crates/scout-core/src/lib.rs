//! scout-core: Core types and the research loop for deepscout
//!
//! This crate provides the capability traits the research loop consumes
//! (completion, search, content extraction) and the four components that
//! drive a run: query planning, evidence collection, report synthesis,
//! and the bounded orchestration loop that composes them.

pub mod collector;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod parse;
pub mod planner;
pub mod provider;
pub mod report;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use collector::{
    EvidenceCollector, EvidenceNote, CONTENT_PREFIX_CHARS, SEARCH_RESULT_LIMIT, URLS_PER_QUERY,
};
pub use error::Error;
pub use message::{Message, Role};
pub use orchestrator::{Orchestrator, ResearchState, MAX_ITERATIONS};
pub use parse::{contains_done, parse_query_lines, truncate_chars, DONE_SENTINEL};
pub use planner::{QueryPlanner, RECENCY_WINDOW};
pub use provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, ContentProvider, SearchProvider,
};
pub use report::{ReportSynthesizer, SynthesizerOptions, DEFAULT_MAX_CONTEXT_CHARS};

pub type Result<T> = std::result::Result<T, Error>;
