//! Multimodal prompt content blocks.

use serde::{Deserialize, Serialize};

/// One atomic unit of a prompt payload.
///
/// Serialises in the Messages API content-block shape so the packaged
/// evidence can be sent upstream without another conversion step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentBlock {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Builds a base64 image block, stripping any `data:...;base64,` prefix.
    #[must_use]
    pub fn image(media_type: impl Into<String>, base64: &str) -> Self {
        Self::Image {
            source: ImageSource {
                kind: "base64".to_string(),
                media_type: media_type.into(),
                data: strip_data_uri(base64).to_string(),
            },
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Removes a leading `data:<media type>;base64,` prefix if present.
#[must_use]
pub fn strip_data_uri(data: &str) -> &str {
    if !data.starts_with("data:") {
        return data;
    }
    match data.find(";base64,") {
        Some(idx) => &data[idx + ";base64,".len()..],
        None => data,
    }
}
