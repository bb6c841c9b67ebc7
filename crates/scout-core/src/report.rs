//! Report synthesis: one completion call over the full evidence set.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::collector::EvidenceNote;
use crate::error::Error;
use crate::message::Message;
use crate::parse::truncate_chars;
use crate::provider::{CompletionProvider, CompletionRequest};

/// Default cap on the joined evidence block handed to the model.
/// Keeps the synthesis prompt inside realistic completion-context limits.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 60_000;

#[derive(Debug, Clone)]
pub struct SynthesizerOptions {
    /// Maximum characters of joined evidence context; None disables capping.
    pub max_context_chars: Option<usize>,
}

impl Default for SynthesizerOptions {
    fn default() -> Self {
        Self {
            max_context_chars: Some(DEFAULT_MAX_CONTEXT_CHARS),
        }
    }
}

pub struct ReportSynthesizer {
    provider: Arc<dyn CompletionProvider>,
    options: SynthesizerOptions,
}

impl ReportSynthesizer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            options: SynthesizerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SynthesizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Synthesize the final report from the full evidence set.
    ///
    /// An empty evidence set is valid input and produces a degenerate report.
    /// The raw completion text is returned without post-processing.
    pub async fn synthesize(
        &self,
        topic: &str,
        evidence: &[EvidenceNote],
    ) -> Result<String, Error> {
        let context = evidence
            .iter()
            .map(format_note)
            .collect::<Vec<_>>()
            .join("\n\n");

        let context = match self.options.max_context_chars {
            Some(max) if context.len() > max => {
                warn!(
                    chars = context.len(),
                    max, "evidence context exceeds cap, truncating"
                );
                truncate_chars(&context, max).to_string()
            }
            _ => context,
        };

        debug!(topic, notes = evidence.len(), chars = context.len(), "synthesizing report");

        let request = CompletionRequest::new(vec![
            Message::system(
                "Synthesize a comprehensive report with sections and data points.",
            ),
            Message::user(format!(
                "Research topic: {topic}\nCollected data:\n{context}"
            )),
        ]);

        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

fn format_note(note: &EvidenceNote) -> String {
    format!(
        "## {}\n**Source:** {}\n{}",
        note.origin_query, note.source_url, note.digest
    )
}
