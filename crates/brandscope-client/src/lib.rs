//! Client-side consumer of the Brandscope analysis stream.
//!
//! [`Analyzer`] posts platform evidence to the analysis server, reads the
//! event stream incrementally, and publishes [`AnalysisState`] snapshots over
//! a `tokio::sync::watch` channel so a UI can render preview text while the
//! model is still writing.

pub mod analyzer;
pub mod error;
pub mod sink;
pub mod state;

pub use analyzer::Analyzer;
pub use error::ClientError;
pub use sink::ReportSink;
pub use state::AnalysisState;
