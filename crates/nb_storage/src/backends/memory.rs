//! In-memory store: the default backend for tests and dry runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use nb_core::{
    AnalysisResult, Error, NewsItem, NewsStore, ProcessingState, Result, StoreStats,
};

#[derive(Default)]
struct Inner {
    items: Vec<NewsItem>,
    next_id: i64,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn exists_by_url_or_title(&self, title: &str, url: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .iter()
            .any(|item| item.url == url || item.title == title))
    }

    async fn insert(&self, item: &NewsItem) -> Result<i64> {
        let mut inner = self.inner.write().await;
        if inner
            .items
            .iter()
            .any(|existing| existing.url == item.url || existing.fingerprint == item.fingerprint)
        {
            return Err(Error::Conflict(item.url.clone()));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let mut stored = item.clone();
        stored.id = Some(id);
        inner.items.push(stored);
        Ok(id)
    }

    async fn list_unprocessed(&self) -> Result<Vec<NewsItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<NewsItem> = inner
            .items
            .iter()
            .filter(|item| item.state == ProcessingState::Unprocessed)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.discovered_at.cmp(&b.discovered_at));
        Ok(items)
    }

    async fn mark_processed(
        &self,
        id: i64,
        state: ProcessingState,
        analysis: &AnalysisResult,
    ) -> Result<()> {
        if !state.is_terminal() {
            return Err(Error::Storage(
                "mark_processed requires a terminal state".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .iter_mut()
            .find(|item| item.id == Some(id))
            .ok_or_else(|| Error::Storage(format!("no item with id {}", id)))?;
        item.state = state;
        item.analysis = Some(analysis.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read().await;
        let mut stats = StoreStats {
            total: inner.items.len() as u64,
            ..StoreStats::default()
        };
        for item in &inner.items {
            match item.state {
                ProcessingState::Unprocessed => stats.unprocessed += 1,
                ProcessingState::Relevant => stats.relevant += 1,
                ProcessingState::NotRelevant => stats.not_relevant += 1,
            }
        }
        Ok(stats)
    }
}
