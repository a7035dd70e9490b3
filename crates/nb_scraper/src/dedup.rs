//! Deduplication gate: a cheap existence pre-check before any fetch work,
//! and an authoritative re-check at persistence time. The persistence-layer
//! uniqueness constraint (url + fingerprint) is the final backstop when two
//! discovery passes race.

use sha2::{Digest, Sha256};

use nb_core::{Error, NewsItem, NewsStore, Result};

/// Content-addressed identity of an item: hash of title and url.
pub fn fingerprint(title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Pre-check run before fetching an article. A matching url OR a matching
/// title counts as existing; title equality knowingly accepts false
/// positives because the source rotates urls for the same story.
pub async fn already_exists(store: &dyn NewsStore, title: &str, url: &str) -> Result<bool> {
    store.exists_by_url_or_title(title, url).await
}

/// Persistence-time check and insert in one step. A storage conflict means
/// another pass won the race, which is "already exists", not an error.
pub async fn insert_if_new(store: &dyn NewsStore, item: &NewsItem) -> Result<Option<i64>> {
    if store.exists_by_url_or_title(&item.title, &item.url).await? {
        return Ok(None);
    }
    match store.insert(item).await {
        Ok(id) => Ok(Some(id)),
        Err(Error::Conflict(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
