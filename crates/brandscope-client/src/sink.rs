//! Best-effort delivery of finished reports to an external collector.

use std::time::Duration;

use brandscope_core::{BrandReport, PlatformEntry};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::ClientError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformRef<'a> {
    platform_id: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct SinkPayload<'a> {
    report: &'a BrandReport,
    platforms: Vec<PlatformRef<'a>>,
}

/// Posts `{report, platforms}` to a webhook. Screenshots and fetched page
/// content are not forwarded, only platform ids and URLs.
#[derive(Debug, Clone)]
pub struct ReportSink {
    client: reqwest::Client,
    url: String,
}

impl ReportSink {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Delivers on a detached task. Failures are logged and never reach the
    /// caller; the handle exists so tests can wait for delivery.
    pub fn notify(&self, report: BrandReport, platforms: Vec<PlatformEntry>) -> JoinHandle<()> {
        let sink = self.clone();
        tokio::spawn(async move {
            match sink.deliver(&report, &platforms).await {
                Ok(()) => tracing::debug!(url = %sink.url, "report delivered to sink"),
                Err(e) => tracing::warn!(url = %sink.url, error = %e, "report sink delivery failed"),
            }
        })
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on transport failure or a non-2xx status.
    pub async fn deliver(
        &self,
        report: &BrandReport,
        platforms: &[PlatformEntry],
    ) -> Result<(), ClientError> {
        let payload = SinkPayload {
            report,
            platforms: platforms
                .iter()
                .map(|p| PlatformRef {
                    platform_id: &p.platform_id,
                    url: &p.url,
                })
                .collect(),
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
