//! Error types for solar-review

use std::path::PathBuf;
use thiserror::Error;

/// Review client errors
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Analyze requested before an image was loaded
    #[error("No image loaded")]
    NoImage,

    /// Export requested before any analysis succeeded
    #[error("No verification result to export")]
    NoResult,

    /// The relay call failed; the session keeps its previous state
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error(transparent)]
    Common(#[from] solar_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
