pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod rules;

pub use models::create_model;
pub use pipeline::{BatchReport, Pipeline, PipelineConfig};
