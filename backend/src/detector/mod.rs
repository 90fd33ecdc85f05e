pub mod classifier;
pub mod enrich;
pub mod intake;
pub mod labels;
pub mod metadata;
pub mod pipeline;
pub mod preprocess;

pub use pipeline::{Pipeline, PipelineError};
