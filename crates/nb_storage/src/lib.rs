use std::sync::Arc;

use nb_core::{Error, NewsStore, Result};

pub mod backends;

pub use backends::*;

/// Build a store from its CLI name. Backend choice is configuration, not
/// logic: everything upstream only sees `dyn NewsStore`.
pub async fn create_store(kind: &str, db_path: Option<&str>) -> Result<Arc<dyn NewsStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = std::path::Path::new(db_path.unwrap_or("rotter_news.db"));
            Ok(Arc::new(SqliteStore::open(path).await?))
        }
        other => Err(Error::Storage(format!(
            "unknown storage backend: {}",
            other
        ))),
    }
}
