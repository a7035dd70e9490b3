use std::sync::Arc;

use nb_core::{Error, LanguageModel, Result};

mod anthropic;

pub use anthropic::AnthropicModel;

/// Build a model backend by name.
pub fn create_model(name: &str, api_key: Option<String>) -> Result<Arc<dyn LanguageModel>> {
    match name {
        "anthropic" => Ok(Arc::new(AnthropicModel::new(api_key)?)),
        other => Err(Error::Model(format!("unknown model backend: {other}"))),
    }
}
