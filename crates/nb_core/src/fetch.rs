use async_trait::async_trait;
use crate::Result;

/// Raw page retrieval. Implementations own their timeout policy; a timeout
/// surfaces to callers as an ordinary fetch failure.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}
