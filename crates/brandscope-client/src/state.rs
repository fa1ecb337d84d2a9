//! Observable state of one analysis and its transition functions.

use brandscope_core::{BrandReport, ProtocolEvent};

/// What a UI renders while an analysis runs.
///
/// Reset at the start of every call, mutated as events arrive, and final
/// once `is_analyzing` drops back to `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    /// Raw model output so far, in arrival order.
    pub streaming_text: String,
    pub report: Option<BrandReport>,
    pub is_analyzing: bool,
    pub error: Option<String>,
}

impl AnalysisState {
    /// Clears everything from a previous call and marks a new one in flight.
    pub fn reset(&mut self) {
        *self = Self {
            is_analyzing: true,
            ..Self::default()
        };
    }

    pub fn on_text_delta(&mut self, text: &str) {
        self.streaming_text.push_str(text);
    }

    pub fn on_report(&mut self, report: BrandReport) {
        self.report = Some(report);
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn on_done(&mut self) {
        self.is_analyzing = false;
    }

    /// Applies one protocol event. The done sentinel only ends reading and
    /// leaves the state untouched; [`AnalysisState::on_done`] runs separately
    /// on every exit path.
    pub fn apply(&mut self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::TextDelta { text } => self.on_text_delta(&text),
            ProtocolEvent::ReportReady { report } => self.on_report(*report),
            ProtocolEvent::Error { error } => self.on_error(error),
            ProtocolEvent::Done => {}
        }
    }
}
