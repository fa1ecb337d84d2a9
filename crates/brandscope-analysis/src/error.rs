use thiserror::Error;

use crate::report::ReportError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model provider rejected the call or reported an in-stream error.
    #[error("upstream model error: {0}")]
    Upstream(String),

    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error(transparent)]
    Report(#[from] ReportError),
}
