use async_trait::async_trait;
use crate::types::{AnalysisResult, NewsItem, ProcessingState, StoreStats};
use crate::Result;

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// True when a record with the same url or the same title already exists.
    /// The title match deliberately accepts false positives: the source
    /// rotates urls for the same story.
    async fn exists_by_url_or_title(&self, title: &str, url: &str) -> Result<bool>;

    /// Store a new item and return its assigned id. Returns
    /// `Error::Conflict` when the url or fingerprint is already present.
    async fn insert(&self, item: &NewsItem) -> Result<i64>;

    /// All unprocessed items, oldest discovery first.
    async fn list_unprocessed(&self) -> Result<Vec<NewsItem>>;

    /// Transition an item out of `Unprocessed` and persist its analysis in
    /// the same write.
    async fn mark_processed(
        &self,
        id: i64,
        state: ProcessingState,
        analysis: &AnalysisResult,
    ) -> Result<()>;

    async fn stats(&self) -> Result<StoreStats>;
}
