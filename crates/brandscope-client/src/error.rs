use thiserror::Error;

/// Shown when the server cannot be reached at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the analysis service. Check your connection and try again.";

pub const NO_BODY_MESSAGE: &str = "No response body";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is already user-facing.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{NO_BODY_MESSAGE}")]
    NoBody,
}

impl ClientError {
    /// The single user-visible string this failure collapses to.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                CONNECTIVITY_MESSAGE.to_string()
            }
            Self::Http(e) => format!("Analysis failed: {e}"),
            Self::Status { message, .. } => message.clone(),
            Self::NoBody => NO_BODY_MESSAGE.to_string(),
        }
    }
}
