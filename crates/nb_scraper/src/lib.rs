pub mod clean;
pub mod coordinator;
pub mod datetime;
pub mod dedup;
pub mod extract;
pub mod fetcher;
pub mod filters;

pub use coordinator::{IngestConfig, IngestCoordinator, IngestReport};
pub use fetcher::HttpFetcher;
