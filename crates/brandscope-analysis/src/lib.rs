//! Analysis pipeline pieces shared by the server and the CLI.
//!
//! Packages platform evidence into a multimodal prompt, streams the model's
//! answer from the Messages API, and validates the JSON report embedded in
//! the model's free-form output.

pub mod anthropic;
pub mod error;
pub mod packager;
pub mod prompt;
pub mod report;

pub use anthropic::{AnthropicClient, UpstreamStream};
pub use error::AnalysisError;
pub use packager::{build_content_blocks, estimate_tokens, BudgetCheck, TokenBudget};
pub use prompt::SYSTEM_PROMPT;
pub use report::{parse_report, ReportError, SchemaIssue};
