//! The validated brand-presence report returned by the model.
//!
//! Field names follow the camelCase JSON the model is instructed to produce.
//! List items carry an `extra` map so auxiliary keys the model adds survive
//! validation and re-serialisation untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [&'static str; 4] = ["low", "medium", "high", "critical"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandReport {
    pub summary: ReportSummary,
    pub consistency: ConsistencySection,
    pub completeness: CompletenessSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilience: Option<ResilienceSection>,
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub overall_score: u8,
    pub headline: String,
    pub key_findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencySection {
    pub score: u8,
    pub analysis: String,
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessSection {
    pub score: u8,
    pub analysis: String,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceSection {
    pub score: u8,
    pub analysis: String,
    pub risks: Vec<Risk>,
}

/// The same brand attribute presented differently across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: String,
    pub platforms: Vec<String>,
    pub description: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub platform: String,
    pub missing: String,
    pub impact: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub risk: String,
    pub description: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    /// 1 is most urgent.
    pub priority: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BrandReport {
    /// Action items ordered by ascending priority; ties keep model order.
    #[must_use]
    pub fn sorted_action_items(&self) -> Vec<&ActionItem> {
        let mut items: Vec<&ActionItem> = self.action_items.iter().collect();
        items.sort_by_key(|item| item.priority);
        items
    }
}
