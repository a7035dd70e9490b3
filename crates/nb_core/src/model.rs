use async_trait::async_trait;
use std::fmt;
use crate::Result;

/// A text completion capability. The pipeline only needs one of these per
/// stage call; differently configured backends may serve different stages.
#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    /// Identifier of the backing model configuration, recorded on every
    /// analysis result.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
}
