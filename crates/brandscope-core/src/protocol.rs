//! Event protocol between the analysis server and its clients.
//!
//! Every event travels as one server-sent-events frame:
//!
//! ```text
//! data: {"type":"text","text":"<chunk>"}
//! data: {"type":"report","report":{...}}
//! data: {"type":"error","error":"<message>"}
//! data: [DONE]
//! ```
//!
//! Exactly one `[DONE]` closes every stream. At most one `report` or `error`
//! precedes it.

use serde::{Deserialize, Serialize};

use crate::report::BrandReport;

/// Payload of the terminal frame.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolEvent {
    #[serde(rename = "text")]
    TextDelta { text: String },
    #[serde(rename = "report")]
    ReportReady { report: Box<BrandReport> },
    #[serde(rename = "error")]
    Error { error: String },
    #[serde(skip)]
    Done,
}

impl ProtocolEvent {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    #[must_use]
    pub fn report(report: BrandReport) -> Self {
        Self::ReportReady {
            report: Box::new(report),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Renders the payload that follows `data: ` in the SSE frame.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the event cannot be serialised.
    pub fn to_sse_data(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Done => Ok(DONE_SENTINEL.to_string()),
            other => serde_json::to_string(other),
        }
    }

    /// Renders the complete frame, including the blank-line terminator.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the event cannot be serialised.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", self.to_sse_data()?))
    }

    /// Parses one `data:` payload. The done sentinel yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or an unknown `type`.
    pub fn parse_data(payload: &str) -> Result<Option<Self>, serde_json::Error> {
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return Ok(None);
        }
        serde_json::from_str(payload).map(Some)
    }
}
