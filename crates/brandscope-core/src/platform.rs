//! Evidence submitted for analysis: one entry per platform the brand is on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Pending,
    Fetching,
    Success,
    Error,
}

/// Page content pulled from a platform URL by the page-fetch collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    pub headings: Vec<String>,
    pub links: Vec<String>,
    pub profile_image: Option<String>,
    pub text: String,
}

impl ExtractedContent {
    /// Total characters across every text field, used for token estimates.
    #[must_use]
    pub fn char_count(&self) -> usize {
        let count = |s: &str| s.chars().count();
        count(&self.title)
            + count(&self.description)
            + self.headings.iter().map(|h| count(h)).sum::<usize>()
            + self.links.iter().map(|l| count(l)).sum::<usize>()
            + self.profile_image.as_deref().map_or(0, count)
            + count(&self.text)
    }
}

/// A screenshot uploaded by the user for a platform that cannot be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    /// Base64 payload, possibly still carrying a `data:<type>;base64,` prefix.
    pub base64: String,
    pub media_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEntry {
    pub platform_id: String,
    pub url: String,
    #[serde(default)]
    pub fetchable: bool,
    #[serde(default)]
    pub fetch_status: FetchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_content: Option<ExtractedContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<UploadedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl PlatformEntry {
    /// Creates a not-yet-fetched entry.
    #[must_use]
    pub fn new(platform_id: impl Into<String>, url: impl Into<String>, fetchable: bool) -> Self {
        Self {
            platform_id: platform_id.into(),
            url: url.into(),
            fetchable,
            fetch_status: FetchStatus::Pending,
            fetched_content: None,
            screenshots: Vec::new(),
            fetch_error: None,
        }
    }

    /// Fetched content, but only once the fetch actually succeeded.
    #[must_use]
    pub fn usable_content(&self) -> Option<&ExtractedContent> {
        match self.fetch_status {
            FetchStatus::Success => self.fetched_content.as_ref(),
            _ => None,
        }
    }

    /// Human-readable platform label for prompts and captions.
    #[must_use]
    pub fn display_name(&self) -> String {
        let known = match self.platform_id.to_ascii_lowercase().as_str() {
            "website" => Some("Website"),
            "instagram" => Some("Instagram"),
            "linkedin" => Some("LinkedIn"),
            "x" | "twitter" => Some("X (Twitter)"),
            "facebook" => Some("Facebook"),
            "tiktok" => Some("TikTok"),
            "youtube" => Some("YouTube"),
            "github" => Some("GitHub"),
            "threads" => Some("Threads"),
            "bluesky" => Some("Bluesky"),
            "pinterest" => Some("Pinterest"),
            _ => None,
        };
        known.map_or_else(|| self.platform_id.clone(), str::to_string)
    }
}
