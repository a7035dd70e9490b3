use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no timestamp found in fragment")]
    NoTimestampFound,

    #[error("no article content recovered from {0}")]
    ExtractionEmpty(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("external error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// A dedup race surfacing from the storage layer is expected, not a failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
