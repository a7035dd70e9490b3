use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an item sits in its one-way processing lifecycle.
/// `Unprocessed` items are picked up by the classification pipeline and move
/// to exactly one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingState {
    Unprocessed,
    Relevant,
    NotRelevant,
}

impl ProcessingState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingState::Unprocessed)
    }
}

/// One discovered forum posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Assigned by the store at insert time.
    pub id: Option<i64>,
    pub title: String,
    pub url: String,
    /// Content-derived hash of title and url, unique across all items.
    pub fingerprint: String,
    pub discovered_at: DateTime<Utc>,
    /// Best-effort wall-clock timestamp recovered from the source markup.
    /// `None` means no timestamp could be recovered; once set it is never
    /// revised by later stages.
    pub published_at: Option<NaiveDateTime>,
    pub raw_content: String,
    /// Cleaned body text, bounded to the cleaner's maximum length.
    pub clean_content: String,
    pub state: ProcessingState,
    /// Present only once `state` is terminal; set at most once.
    pub analysis: Option<AnalysisResult>,
}

/// Output of the four-stage classification pipeline for one item.
///
/// The three stage texts are populated only for relevant items. Persisted
/// atomically with the owning item's state transition and never patched in
/// place afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_relevant: bool,
    pub relevance_reason: String,
    pub research_findings: Option<String>,
    pub technical_analysis: Option<String>,
    pub final_article: Option<String>,
    pub model_used: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: u64,
    pub unprocessed: u64,
    pub relevant: u64,
    pub not_relevant: u64,
}
