use std::fmt;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use nb_core::{Error, LanguageModel, Result};

const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

pub struct AnthropicModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicModel {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = match api_key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(Error::Model("Anthropic API key is required".to_string())),
        };
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }
}

impl fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait::async_trait]
impl LanguageModel for AnthropicModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!(
                "Anthropic API returned {status}: {body}"
            )));
        }

        let response = response.json::<MessagesResponse>().await?;
        let text = response
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| Error::Model("Anthropic API returned no content".to_string()))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_requires_api_key() {
        assert!(AnthropicModel::new(None).is_err());
        assert!(AnthropicModel::new(Some(String::new())).is_err());

        let model = AnthropicModel::new(Some("test-key".to_string()));
        assert!(model.is_ok());
        assert_eq!(model.unwrap().name(), DEFAULT_MODEL);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let model = AnthropicModel::new(Some("super-secret".to_string())).unwrap();
        let rendered = format!("{model:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
