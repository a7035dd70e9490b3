//! The four-stage classification pipeline: relevance, research, technical
//! analysis, journalistic rewrite. Stages run strictly in order and a later
//! stage never executes after a stop; a failed model call degrades that one
//! stage to a marked placeholder instead of aborting the item.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use nb_core::{
    AnalysisResult, LanguageModel, NewsStore, ProcessingState, Result,
};

use crate::prompts;
use crate::rules::veto_category;

const RELEVANCE_MAX_TOKENS: u32 = 200;
const RELEVANCE_TEMPERATURE: f32 = 0.1;
const RESEARCH_MAX_TOKENS: u32 = 1500;
const RESEARCH_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 2000;
const ANALYSIS_TEMPERATURE: f32 = 0.3;
const REWRITE_MAX_TOKENS: u32 = 2000;
const REWRITE_TEMPERATURE: f32 = 0.4;

/// Placeholder prefixes substituted when a stage's model call fails. The
/// fixed literal lets an operator tell degraded output from genuine text.
const RELEVANCE_FAILED: &str = "relevance check failed";
const RESEARCH_FAILED: &str = "research failed";
const ANALYSIS_FAILED: &str = "technical analysis failed";
const REWRITE_FAILED: &str = "journalistic rewrite failed";

/// Research quality gate: phrases a substantive, sourced answer contains.
const CITATION_MARKERS: &[&str] = &[
    "מקורות שנמצאו",
    "לפי דיווח",
    "על פי",
    "מתוך כתבה",
    "הצהרה של",
    "לדברי",
    "בעיתון",
    "באתר",
];
const NOTHING_FOUND_MARKER: &str = "לא מצאתי";
const MIN_RESEARCH_CHARS: usize = 150;

/// A research result passes iff it cites at least one source phrase, is
/// long enough to be substantive, and does not declare that nothing was
/// found.
pub fn research_passes_gate(result: &str) -> bool {
    let has_sources = CITATION_MARKERS.iter().any(|m| result.contains(m));
    has_sources
        && result.chars().count() >= MIN_RESEARCH_CHARS
        && !result.contains(NOTHING_FOUND_MARKER)
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Politeness pause between successive stage calls.
    pub stage_delay: Duration,
    /// Politeness pause between successive items in a batch.
    pub item_delay: Duration,
    /// Article content is capped at this many characters per prompt.
    pub content_cap: usize,
    /// Initial-summary cap handed to the research stage.
    pub summary_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_secs(1),
            item_delay: Duration::from_secs(2),
            content_cap: 2000,
            summary_cap: 500,
        }
    }
}

/// Counters for one classification batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub relevant: usize,
    pub not_relevant: usize,
}

pub struct Pipeline {
    model: Arc<dyn LanguageModel>,
    config: PipelineConfig,
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl Pipeline {
    pub fn new(model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self { model, config }
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Stage 1. A model failure defaults to relevant: the veto is the only
    /// thing that stops an item, and a broken call must not silently drop
    /// coverage.
    async fn check_relevance(&self, title: &str, content: &str) -> (bool, String) {
        let prompt = prompts::relevance(title, truncate_chars(content, self.config.content_cap));
        match self
            .model
            .complete(&prompt, RELEVANCE_MAX_TOKENS, RELEVANCE_TEMPERATURE)
            .await
        {
            Ok(response) => match veto_category(&response) {
                Some(category) => {
                    info!(?category, "relevance veto");
                    (false, response)
                }
                None => (true, response),
            },
            Err(e) => {
                warn!(error = %e, "relevance stage failed");
                (true, format!("{}: {}", RELEVANCE_FAILED, e))
            }
        }
    }

    /// Stage 2 with the quality gate: exactly one retry with an intensified
    /// prompt, and the retry's result is accepted unconditionally.
    async fn research(&self, topic: &str, summary: &str) -> String {
        let prompt = prompts::research(topic, summary);
        let first = match self
            .model
            .complete(&prompt, RESEARCH_MAX_TOKENS, RESEARCH_TEMPERATURE)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "research stage failed");
                return format!("{}: {}", RESEARCH_FAILED, e);
            }
        };

        if research_passes_gate(&first) {
            return first;
        }

        warn!("research quality low, retrying once");
        match self
            .model
            .complete(
                &prompts::research_retry(topic),
                RESEARCH_MAX_TOKENS,
                RESEARCH_TEMPERATURE,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "research retry failed");
                format!("{}: {}", RESEARCH_FAILED, e)
            }
        }
    }

    async fn technical_analysis(&self, content: &str, findings: &str) -> String {
        let prompt = prompts::technical_analysis(
            truncate_chars(content, self.config.content_cap),
            findings,
        );
        match self
            .model
            .complete(&prompt, ANALYSIS_MAX_TOKENS, ANALYSIS_TEMPERATURE)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "technical analysis stage failed");
                format!("{}: {}", ANALYSIS_FAILED, e)
            }
        }
    }

    async fn journalistic_rewrite(&self, analysis: &str) -> String {
        let prompt = prompts::journalistic_rewrite(analysis);
        match self
            .model
            .complete(&prompt, REWRITE_MAX_TOKENS, REWRITE_TEMPERATURE)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "journalistic rewrite stage failed");
                format!("{}: {}", REWRITE_FAILED, e)
            }
        }
    }

    /// Run all four stages over one item's title and cleaned content.
    /// Always produces a result, possibly with placeholder stage text.
    pub async fn analyze(&self, title: &str, content: &str) -> AnalysisResult {
        info!(title = %truncate_chars(title, 50), "stage 1: relevance");
        let (is_relevant, relevance_reason) = self.check_relevance(title, content).await;

        if !is_relevant {
            info!("item not relevant, pipeline halts");
            return AnalysisResult {
                is_relevant: false,
                relevance_reason,
                research_findings: None,
                technical_analysis: None,
                final_article: None,
                model_used: self.model.name().to_string(),
                processed_at: Utc::now(),
            };
        }

        self.pause(self.config.stage_delay).await;
        info!("stage 2: research");
        let findings = self
            .research(title, truncate_chars(content, self.config.summary_cap))
            .await;

        self.pause(self.config.stage_delay).await;
        info!("stage 3: technical analysis");
        let analysis = self.technical_analysis(content, &findings).await;

        self.pause(self.config.stage_delay).await;
        info!("stage 4: journalistic rewrite");
        let article = self.journalistic_rewrite(&analysis).await;

        AnalysisResult {
            is_relevant: true,
            relevance_reason,
            research_findings: Some(findings),
            technical_analysis: Some(analysis),
            final_article: Some(article),
            model_used: self.model.name().to_string(),
            processed_at: Utc::now(),
        }
    }

    /// Process the store's unprocessed backlog, oldest first. Each item's
    /// state transition and analysis persist atomically and independently;
    /// an interrupted batch leaves completed items valid.
    pub async fn process_batch(
        &self,
        store: &dyn NewsStore,
        limit: Option<usize>,
    ) -> Result<BatchReport> {
        let mut items = store.list_unprocessed().await?;
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        info!(count = items.len(), "processing unprocessed items");

        let mut report = BatchReport::default();
        let total = items.len();
        for (index, item) in items.iter().enumerate() {
            let Some(id) = item.id else {
                warn!(title = %item.title, "unprocessed item without id, skipping");
                continue;
            };

            let result = self.analyze(&item.title, &item.clean_content).await;
            let state = if result.is_relevant {
                report.relevant += 1;
                ProcessingState::Relevant
            } else {
                report.not_relevant += 1;
                ProcessingState::NotRelevant
            };
            store.mark_processed(id, state, &result).await?;
            report.processed += 1;

            if index + 1 < total {
                self.pause(self.config.item_delay).await;
            }
        }

        info!(
            processed = report.processed,
            relevant = report.relevant,
            not_relevant = report.not_relevant,
            "batch complete"
        );
        Ok(report)
    }
}
