// Pipeline errors
// Only conditions that stop a whole run surface here; per-file and
// per-category failures are folded into the reports

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Dataset folder not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to read dataset folder {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output folder {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to serialize summary: {0}")]
    Summary(#[from] serde_json::Error),
}
