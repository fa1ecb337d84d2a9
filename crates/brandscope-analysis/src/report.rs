//! Extraction and schema validation of the report embedded in model output.
//!
//! Models wrap JSON in code fences or explanatory prose often enough that the
//! raw text cannot be handed straight to `serde_json`. [`parse_report`] peels
//! those wrappers, then checks the value field by field so a failure lists
//! every problem at once instead of stopping at the first.

use std::fmt;
use std::sync::LazyLock;

use brandscope_core::{BrandReport, Severity};
use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;

static FENCE_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid fence regex"));

/// First `{` through last `}`.
static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("model response failed schema validation: {}", join_issues(.0))]
    SchemaMismatch(Vec<SchemaIssue>),
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extracts, parses, and validates a [`BrandReport`] from raw model output.
///
/// # Errors
///
/// - [`ReportError::MalformedJson`] if no parseable JSON is found.
/// - [`ReportError::SchemaMismatch`] if the JSON does not match the report
///   schema; the error lists every failing field path.
pub fn parse_report(raw: &str) -> Result<BrandReport, ReportError> {
    let candidate = extract_json(raw);
    let mut value: Value =
        serde_json::from_str(candidate).map_err(|e| ReportError::MalformedJson(e.to_string()))?;

    let issues = check_report(&value);
    if !issues.is_empty() {
        return Err(ReportError::SchemaMismatch(issues));
    }

    normalise_integral_floats(&mut value);
    serde_json::from_value(value).map_err(|e| {
        ReportError::SchemaMismatch(vec![SchemaIssue {
            path: "(root)".to_string(),
            reason: e.to_string(),
        }])
    })
}

/// Integer value of a JSON number, accepting floats with no fractional part
/// (`85.0`).
fn as_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => integral(n),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral(n: &Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
    })
}

/// Rewrites `85.0` as `85` so integer fields deserialise.
fn normalise_integral_floats(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(int) = integral(n) {
                *n = Number::from(int);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalise_integral_floats),
        Value::Object(map) => map.values_mut().for_each(normalise_integral_floats),
        _ => {}
    }
}

/// Strips code fences and surrounding prose, returning the JSON candidate.
fn extract_json(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        if let Some(opener) = FENCE_OPENER.find(text) {
            text = &text[opener.end()..];
        }
        if let Some(inner) = text.trim_end().strip_suffix("```") {
            text = inner;
        }
        text = text.trim();
    }

    if !text.starts_with('{') {
        if let Some(span) = OBJECT_SPAN.find(text) {
            return span.as_str();
        }
    }
    text
}

fn check_report(value: &Value) -> Vec<SchemaIssue> {
    let mut checker = Checker::default();
    let Some(root) = checker.object(Some(value), "(root)") else {
        return checker.issues;
    };

    if let Some(summary) = checker.object(root.get("summary"), "summary") {
        checker.score(summary, "overallScore", "summary.overallScore");
        checker.string(summary, "headline", "summary.headline");
        checker.string_array(summary, "keyFindings", "summary.keyFindings");
    }

    if let Some(section) = checker.object(root.get("consistency"), "consistency") {
        checker.scored_section(section, "consistency");
        for (idx, item) in checker.array(section, "mismatches", "consistency.mismatches") {
            let path = format!("consistency.mismatches[{idx}]");
            if let Some(item) = checker.object(Some(item), &path) {
                checker.string(item, "field", &format!("{path}.field"));
                checker.string_array(item, "platforms", &format!("{path}.platforms"));
                checker.string(item, "description", &format!("{path}.description"));
                checker.severity(item, &format!("{path}.severity"));
            }
        }
    }

    if let Some(section) = checker.object(root.get("completeness"), "completeness") {
        checker.scored_section(section, "completeness");
        for (idx, item) in checker.array(section, "gaps", "completeness.gaps") {
            let path = format!("completeness.gaps[{idx}]");
            if let Some(item) = checker.object(Some(item), &path) {
                checker.string(item, "platform", &format!("{path}.platform"));
                checker.string(item, "missing", &format!("{path}.missing"));
                checker.string(item, "impact", &format!("{path}.impact"));
                checker.severity(item, &format!("{path}.severity"));
                if item.get("examples").is_some_and(|v| !v.is_null()) {
                    checker.string_array(item, "examples", &format!("{path}.examples"));
                }
            }
        }
    }

    if root.get("resilience").is_some_and(|v| !v.is_null()) {
        if let Some(section) = checker.object(root.get("resilience"), "resilience") {
            checker.scored_section(section, "resilience");
            for (idx, item) in checker.array(section, "risks", "resilience.risks") {
                let path = format!("resilience.risks[{idx}]");
                if let Some(item) = checker.object(Some(item), &path) {
                    checker.string(item, "risk", &format!("{path}.risk"));
                    checker.string(item, "description", &format!("{path}.description"));
                    checker.severity(item, &format!("{path}.severity"));
                }
            }
        }
    }

    for (idx, item) in checker.array(root, "actionItems", "actionItems") {
        let path = format!("actionItems[{idx}]");
        if let Some(item) = checker.object(Some(item), &path) {
            checker.priority(item, &format!("{path}.priority"));
            checker.string(item, "title", &format!("{path}.title"));
            checker.string(item, "description", &format!("{path}.description"));
            if item.get("platforms").is_some() {
                checker.string_array(item, "platforms", &format!("{path}.platforms"));
            }
        }
    }

    checker.issues
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<SchemaIssue>,
}

impl Checker {
    fn fail(&mut self, path: &str, reason: impl Into<String>) {
        self.issues.push(SchemaIssue {
            path: path.to_string(),
            reason: reason.into(),
        });
    }

    fn object<'a>(&mut self, value: Option<&'a Value>, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            None => {
                self.fail(path, "required");
                None
            }
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                self.fail(path, format!("expected object, got {}", type_name(other)));
                None
            }
        }
    }

    fn array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> std::iter::Enumerate<std::slice::Iter<'a, Value>> {
        const EMPTY: &[Value] = &[];
        match obj.get(key) {
            Some(Value::Array(items)) => items.iter().enumerate(),
            None => {
                self.fail(path, "required");
                EMPTY.iter().enumerate()
            }
            Some(other) => {
                self.fail(path, format!("expected array, got {}", type_name(other)));
                EMPTY.iter().enumerate()
            }
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            Some(Value::String(_)) => {}
            None => self.fail(path, "required"),
            Some(other) => self.fail(path, format!("expected string, got {}", type_name(other))),
        }
    }

    fn string_array(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        let items: Vec<(usize, &Value)> = self.array(obj, key, path).collect();
        for (idx, item) in items {
            if !item.is_string() {
                self.fail(
                    &format!("{path}[{idx}]"),
                    format!("expected string, got {}", type_name(item)),
                );
            }
        }
    }

    fn score(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            None => self.fail(path, "required"),
            Some(value) => match as_integer(value) {
                Some(n) if n <= 100 => {}
                _ => self.fail(
                    path,
                    format!("expected integer between 0 and 100, got {value}"),
                ),
            },
        }
    }

    fn priority(&mut self, obj: &Map<String, Value>, path: &str) {
        match obj.get("priority") {
            None => self.fail(path, "required"),
            Some(value) => match as_integer(value) {
                Some(n) if n >= 1 && u32::try_from(n).is_ok() => {}
                _ => self.fail(path, format!("expected positive integer, got {value}")),
            },
        }
    }

    fn severity(&mut self, obj: &Map<String, Value>, path: &str) {
        match obj.get("severity") {
            None => self.fail(path, "required"),
            Some(Value::String(s)) if Severity::ALL.contains(&s.as_str()) => {}
            Some(other) => self.fail(
                path,
                format!("expected one of {}, got {other}", Severity::ALL.join("|")),
            ),
        }
    }

    fn scored_section(&mut self, section: &Map<String, Value>, name: &str) {
        self.score(section, "score", &format!("{name}.score"));
        self.string(section, "analysis", &format!("{name}.analysis"));
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
