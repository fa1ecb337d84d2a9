//! Shared data model and configuration for Brandscope.
//!
//! Everything that crosses a crate or process boundary lives here: the
//! platform evidence submitted for analysis, the prompt content blocks built
//! from it, the validated [`BrandReport`], and the [`ProtocolEvent`] stream
//! exchanged between the analysis server and its clients.

pub mod app_config;
pub mod config;
pub mod content;
pub mod platform;
pub mod protocol;
pub mod report;
pub mod sse;

pub use app_config::{AppConfig, ClientConfig, Environment};
pub use config::{load_app_config, load_client_config, ConfigError};
pub use content::{ContentBlock, ImageSource};
pub use platform::{ExtractedContent, FetchStatus, PlatformEntry, UploadedImage};
pub use protocol::ProtocolEvent;
pub use report::{
    ActionItem, BrandReport, CompletenessSection, ConsistencySection, Gap, Mismatch, ResilienceSection,
    ReportSummary, Risk, Severity,
};
