pub mod error;
pub mod fetch;
pub mod model;
pub mod store;
pub mod types;

pub use error::Error;
pub use error::Result;
pub use fetch::PageFetcher;
pub use model::LanguageModel;
pub use store::NewsStore;
pub use types::{AnalysisResult, NewsItem, ProcessingState, StoreStats};
