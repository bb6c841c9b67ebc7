//! The research loop: Planning → Collecting → Deciding → Reporting.
//!
//! One orchestrator run handles one topic. Concurrency exists only inside a
//! run: every not-yet-collected query fans out through the collector, and the
//! loop does not advance until all of them have completed. Collection tasks
//! return their notes by value and the orchestrator appends them after
//! fan-in, so there is no shared mutable state during the fan-out.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::collector::{EvidenceCollector, EvidenceNote};
use crate::error::Error;
use crate::planner::QueryPlanner;
use crate::provider::{CompletionProvider, ContentProvider, SearchProvider};
use crate::report::{ReportSynthesizer, SynthesizerOptions};

/// Hard cap on search iterations. A fixed safety bound against runaway query
/// expansion; deliberately not user-configurable.
pub const MAX_ITERATIONS: u32 = 3;

/// The mutable working set of one research run.
///
/// Owned exclusively by the orchestrator for the lifetime of the run and
/// discarded when it completes. Both sequences are append-only.
#[derive(Debug, Default)]
pub struct ResearchState {
    pub active_queries: Vec<String>,
    pub evidence: Vec<EvidenceNote>,
    pub iteration: u32,
    /// Index of the first query not yet collected. Queries are collected
    /// exactly once, in the iteration they were introduced.
    collected: usize,
}

impl ResearchState {
    fn pending_queries(&mut self) -> Vec<String> {
        let pending = self.active_queries[self.collected..].to_vec();
        self.collected = self.active_queries.len();
        pending
    }

    /// Append new queries, deduplicating by exact text against the ones
    /// already active. No semantic dedup is attempted.
    fn extend_queries(&mut self, queries: Vec<String>) {
        for query in queries {
            if !self.active_queries.contains(&query) {
                self.active_queries.push(query);
            }
        }
    }

    fn digests(&self) -> Vec<String> {
        self.evidence.iter().map(|n| n.digest.clone()).collect()
    }
}

pub struct Orchestrator {
    planner: QueryPlanner,
    collector: EvidenceCollector,
    synthesizer: ReportSynthesizer,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            planner: QueryPlanner::new(provider.clone()),
            collector: EvidenceCollector::new(provider.clone(), search, content),
            synthesizer: ReportSynthesizer::new(provider),
        }
    }

    pub fn with_synthesizer_options(mut self, options: SynthesizerOptions) -> Self {
        self.synthesizer = self.synthesizer.with_options(options);
        self
    }

    /// Run one end-to-end research pass and return the report text.
    ///
    /// Completion or search failures during Planning, Deciding, Collecting,
    /// or Reporting are run-fatal; the run never partially succeeds with a
    /// stale report. Single-URL failures are absorbed inside the collector.
    pub async fn run(&self, topic: &str) -> Result<String, Error> {
        let mut state = ResearchState::default();

        // Planning
        state.active_queries = self.planner.initial_queries(topic).await?;
        info!(topic, queries = state.active_queries.len(), "research run started");

        // Degenerate but valid: nothing to search, report on empty evidence.
        if !state.active_queries.is_empty() {
            state.iteration = 1;

            loop {
                // Collecting: fan out over every query added since the last pass.
                let pending = state.pending_queries();
                debug!(
                    iteration = state.iteration,
                    queries = pending.len(),
                    "collecting evidence"
                );

                let results =
                    join_all(pending.iter().map(|q| self.collector.collect(q))).await;
                for result in results {
                    state.evidence.extend(result?);
                }

                info!(
                    iteration = state.iteration,
                    evidence = state.evidence.len(),
                    "collection pass complete"
                );

                // Deciding
                let new_queries = self
                    .planner
                    .next_queries(topic, &state.active_queries, &state.digests())
                    .await?;

                if new_queries.is_empty() {
                    debug!(iteration = state.iteration, "planner converged");
                    break;
                }
                if state.iteration >= MAX_ITERATIONS {
                    debug!("iteration cap reached");
                    break;
                }

                state.extend_queries(new_queries);
                state.iteration += 1;
            }
        }

        // Reporting
        info!(topic, evidence = state.evidence.len(), "synthesizing final report");
        self.synthesizer.synthesize(topic, &state.evidence).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompletion, MockContent, MockSearch};

    struct Fixture {
        provider: Arc<MockCompletion>,
        search: Arc<MockSearch>,
        content: Arc<MockContent>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                provider: Arc::new(MockCompletion::new()),
                search: Arc::new(MockSearch::new()),
                content: Arc::new(MockContent::new()),
            }
        }

        fn orchestrator(&self) -> Orchestrator {
            Orchestrator::new(
                self.provider.clone(),
                self.search.clone(),
                self.content.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_single_pass_run() {
        // Topic "X": two initial queries, one URL each, planner stops after
        // one pass. The report must be built from exactly two notes.
        let fx = Fixture::new();
        fx.search.insert("a", vec!["https://e.com/a".to_string()]);
        fx.search.insert("b", vec!["https://e.com/b".to_string()]);
        fx.content.insert("https://e.com/a", "content a");
        fx.content.insert("https://e.com/b", "content b");

        fx.provider.queue_response("- a\n- b"); // initial queries
        fx.provider.queue_response("digest a"); // condensation (2 urls)
        fx.provider.queue_response("digest b");
        fx.provider.queue_response("<done>"); // deciding
        fx.provider.queue_response("# Final report"); // synthesis

        let report = fx.orchestrator().run("X").await.unwrap();
        assert_eq!(report, "# Final report");

        // One planning, two condensations, one decision, one synthesis.
        assert_eq!(fx.provider.request_count(), 5);

        // The synthesis prompt carries both digests.
        let synthesis = fx.provider.last_request().unwrap();
        let user = &synthesis.messages[1].content;
        assert!(user.contains("digest a"));
        assert!(user.contains("digest b"));
    }

    #[tokio::test]
    async fn test_iteration_cap_holds_against_eager_planner() {
        // Search never finds anything, so every pass collects zero notes,
        // and the planner always asks for more. The cap must stop the loop.
        let fx = Fixture::new();

        fx.provider.queue_response("- q1"); // initial
        fx.provider.queue_response("- q2"); // decide 1: continue
        fx.provider.queue_response("- q3"); // decide 2: continue
        fx.provider.queue_response("- q4"); // decide 3: ignored, cap reached
        fx.provider.queue_response("degenerate report"); // synthesis

        let report = fx.orchestrator().run("topic").await.unwrap();
        assert_eq!(report, "degenerate report");
        // 1 planning + 3 decisions + 1 synthesis, and nothing more.
        assert_eq!(fx.provider.request_count(), 5);
    }

    #[tokio::test]
    async fn test_empty_initial_queries_reports_directly() {
        let fx = Fixture::new();
        fx.provider.queue_response(""); // planner returns nothing
        fx.provider.queue_response("nothing to report");

        let report = fx.orchestrator().run("topic").await.unwrap();
        assert_eq!(report, "nothing to report");
        // Planning + synthesis only; no deciding call ever happens.
        assert_eq!(fx.provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_planning_failure_is_run_fatal() {
        let fx = Fixture::new();
        fx.provider.queue_error(Error::api(401, "bad key"));

        let err = fx.orchestrator().run("topic").await.unwrap_err();
        assert!(err.to_string().contains("bad key"));
        assert_eq!(fx.provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_is_run_fatal() {
        let fx = Fixture::new();
        fx.search.fail_with("quota exhausted");
        fx.provider.queue_response("- q1");

        let err = fx.orchestrator().run("topic").await.unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_empty_search_results_still_reach_reporting() {
        let fx = Fixture::new();
        // Search returns no URLs for the only query.
        fx.search.insert("q1", Vec::new());

        fx.provider.queue_response("- q1");
        fx.provider.queue_response("<done>");
        fx.provider.queue_response("empty-evidence report");

        let report = fx.orchestrator().run("topic").await.unwrap();
        assert_eq!(report, "empty-evidence report");
    }

    #[tokio::test]
    async fn test_second_iteration_only_collects_new_queries() {
        let fx = Fixture::new();
        fx.search.insert("q1", vec!["https://e.com/1".to_string()]);
        fx.search.insert("q2", vec!["https://e.com/2".to_string()]);
        fx.content.insert("https://e.com/1", "one");
        fx.content.insert("https://e.com/2", "two");

        fx.provider.queue_response("- q1"); // initial
        fx.provider.queue_response("digest 1"); // condense q1
        fx.provider.queue_response("- q2"); // decide: continue
        fx.provider.queue_response("digest 2"); // condense q2 only
        fx.provider.queue_response("<done>"); // decide: stop
        fx.provider.queue_response("report"); // synthesis

        fx.orchestrator().run("topic").await.unwrap();

        // q1 searched once, q2 searched once; q1 never re-collected.
        let calls = fx.search.calls();
        assert_eq!(calls, vec![("q1".to_string(), SEARCH_LIMIT), ("q2".to_string(), SEARCH_LIMIT)]);
    }

    #[tokio::test]
    async fn test_duplicate_follow_up_queries_are_dropped() {
        let fx = Fixture::new();
        fx.search.insert("q1", Vec::new());

        fx.provider.queue_response("- q1"); // initial
        fx.provider.queue_response("- q1"); // decide: repeats the same query
        fx.provider.queue_response("<done>"); // decide again: stop
        fx.provider.queue_response("report");

        fx.orchestrator().run("topic").await.unwrap();

        // The repeated query is dropped, so the second pass collects nothing
        // and q1 is only ever searched once.
        assert_eq!(fx.search.calls().len(), 1);
    }

    const SEARCH_LIMIT: usize = crate::collector::SEARCH_RESULT_LIMIT;
}
