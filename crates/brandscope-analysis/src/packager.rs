//! Evidence packaging: platform entries in, prompt content blocks out.

use brandscope_core::{ContentBlock, ExtractedContent, PlatformEntry};

/// Page text beyond this many characters is dropped from the prompt.
pub const MAX_PAGE_TEXT_CHARS: usize = 2000;
/// Outbound links listed per platform.
pub const MAX_LINKS: usize = 20;

/// Fixed allowance for the system prompt and response scaffolding.
const BASE_TOKENS: usize = 1500;
const PER_ENTRY_TOKENS: usize = 100;
/// Rough cost of one resized screenshot.
const PER_SCREENSHOT_TOKENS: usize = 1600;

const CLOSING_INSTRUCTION: &str = "Analyze the brand presence across all platforms above. \
Compare names, bios, visual identity, contact details, and messaging. Respond with the JSON \
object described in the system prompt.";

/// Builds the user-message content for one analysis.
///
/// Layout: one leading overview block, then per platform a header block, an
/// optional content block, and an image plus caption per screenshot, then one
/// closing instruction block.
#[must_use]
pub fn build_content_blocks(entries: &[PlatformEntry]) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(entries.len() * 2 + 2);
    blocks.push(ContentBlock::text(format!(
        "Analyzing {} platform(s) for brand presence consistency.",
        entries.len()
    )));

    for (idx, entry) in entries.iter().enumerate() {
        let name = entry.display_name();
        let content = entry.usable_content();

        blocks.push(ContentBlock::text(format!(
            "## Platform {}: {name}\nURL: {}\nData source: {}",
            idx + 1,
            entry.url,
            data_source(content, entry.screenshots.len()),
        )));

        if let Some(described) = content.map(describe_content).filter(|d| !d.is_empty()) {
            blocks.push(ContentBlock::text(described));
        }

        let total = entry.screenshots.len();
        for (shot_idx, shot) in entry.screenshots.iter().enumerate() {
            blocks.push(ContentBlock::image(shot.media_type.clone(), &shot.base64));
            blocks.push(ContentBlock::text(format!(
                "Screenshot {} of {total} for {name}",
                shot_idx + 1
            )));
        }
    }

    blocks.push(ContentBlock::text(CLOSING_INSTRUCTION));
    blocks
}

fn data_source(content: Option<&ExtractedContent>, screenshots: usize) -> String {
    if content.is_some() {
        "auto-fetched content".to_string()
    } else if screenshots > 0 {
        format!("{screenshots} screenshot(s)")
    } else {
        "URL only (no data available)".to_string()
    }
}

fn describe_content(content: &ExtractedContent) -> String {
    let mut lines = Vec::new();
    if !content.title.is_empty() {
        lines.push(format!("Title: {}", content.title));
    }
    if !content.description.is_empty() {
        lines.push(format!("Description: {}", content.description));
    }
    if !content.headings.is_empty() {
        lines.push(format!("Headings: {}", content.headings.join(" | ")));
    }
    if !content.links.is_empty() {
        let links: Vec<&str> = content
            .links
            .iter()
            .take(MAX_LINKS)
            .map(String::as_str)
            .collect();
        lines.push(format!("Links: {}", links.join(", ")));
    }
    if let Some(photo) = content.profile_image.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("Profile photo: {photo}"));
    }
    if !content.text.is_empty() {
        lines.push(format!("Page text:\n{}", truncate_chars(&content.text, MAX_PAGE_TEXT_CHARS)));
    }
    lines.join("\n")
}

/// Cuts `text` to at most `max` characters, never splitting a character.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Advisory prompt-size estimate in tokens.
///
/// `1500 + Σ (100 + ceil(fetched chars / 4) + 1600 × screenshots)`.
#[must_use]
pub fn estimate_tokens(entries: &[PlatformEntry]) -> usize {
    entries.iter().fold(BASE_TOKENS, |total, entry| {
        let text_tokens = entry
            .usable_content()
            .map_or(0, |c| c.char_count().div_ceil(4));
        total + PER_ENTRY_TOKENS + text_tokens + PER_SCREENSHOT_TOKENS * entry.screenshots.len()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    Within { estimate: usize, limit: usize },
    Exceeded { estimate: usize, limit: usize },
}

/// Advisory token limit. Nothing here blocks a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub limit: usize,
}

impl TokenBudget {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    #[must_use]
    pub fn check(&self, entries: &[PlatformEntry]) -> BudgetCheck {
        let estimate = estimate_tokens(entries);
        if estimate > self.limit {
            BudgetCheck::Exceeded {
                estimate,
                limit: self.limit,
            }
        } else {
            BudgetCheck::Within {
                estimate,
                limit: self.limit,
            }
        }
    }
}

#[cfg(test)]
#[path = "packager_test.rs"]
mod tests;
