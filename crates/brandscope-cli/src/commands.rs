//! Handlers for the `estimate` and `analyze` subcommands.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use brandscope_analysis::{BudgetCheck, TokenBudget};
use brandscope_client::{AnalysisState, Analyzer};
use brandscope_core::{ClientConfig, PlatformEntry};
use serde::Deserialize;
use tokio::sync::watch;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlatformsFile {
    Wrapped { platforms: Vec<PlatformEntry> },
    Bare(Vec<PlatformEntry>),
}

/// Parses a platforms document, wrapped or bare.
///
/// # Errors
///
/// Returns an error if the text is not a platforms object or array.
pub(crate) fn parse_platforms(raw: &str) -> anyhow::Result<Vec<PlatformEntry>> {
    let file: PlatformsFile = serde_json::from_str(raw)
        .context("expected {\"platforms\": [...]} or a JSON array of platform entries")?;
    Ok(match file {
        PlatformsFile::Wrapped { platforms } | PlatformsFile::Bare(platforms) => platforms,
    })
}

/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) fn load_platforms(path: &Path) -> anyhow::Result<Vec<PlatformEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_platforms(&raw).with_context(|| format!("invalid platforms file {}", path.display()))
}

pub(crate) fn estimate_summary(platforms: &[PlatformEntry], limit: usize) -> String {
    let screenshots: usize = platforms.iter().map(|p| p.screenshots.len()).sum();
    let verdict = match TokenBudget::new(limit).check(platforms) {
        BudgetCheck::Within { estimate, limit } => {
            format!("~{estimate} tokens, within the {limit} token budget")
        }
        BudgetCheck::Exceeded { estimate, limit } => {
            format!("~{estimate} tokens, exceeds the {limit} token budget")
        }
    };
    format!(
        "{} platform(s), {screenshots} screenshot(s): {verdict}",
        platforms.len()
    )
}

pub(crate) fn run_estimate(platforms: &[PlatformEntry], limit: usize) {
    println!("{}", estimate_summary(platforms, limit));
}

/// Runs one analysis, echoing preview text to stderr while it streams.
///
/// # Errors
///
/// Returns an error when the analysis ends without a report, or when the
/// report cannot be written.
pub(crate) async fn run_analyze(
    config: &ClientConfig,
    platforms: &[PlatformEntry],
    out: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let analyzer = Analyzer::from_config(config)?;
    tracing::info!(endpoint = analyzer.endpoint(), platforms = platforms.len(), "starting analysis");

    let preview = (!quiet).then(|| tokio::spawn(echo_preview(analyzer.subscribe())));
    let state = analyzer.analyze(platforms).await;
    drop(analyzer);
    if let Some(handle) = preview {
        handle.await.ok();
        eprintln!();
    }

    if let Some(error) = state.error {
        anyhow::bail!(error);
    }
    let Some(report) = state.report else {
        anyhow::bail!("analysis finished without a report");
    };

    let json = serde_json::to_string_pretty(&report)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "overall score {}: {} (report written to {})",
                report.summary.overall_score,
                report.summary.headline,
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Writes newly arrived preview text until the analyzer is dropped.
async fn echo_preview(mut rx: watch::Receiver<AnalysisState>) {
    let mut printed = 0;
    let mut stderr = std::io::stderr();
    while rx.changed().await.is_ok() {
        let text = rx.borrow_and_update().streaming_text.clone();
        if text.len() < printed {
            printed = 0;
        }
        if text.len() > printed {
            let _ = stderr.write_all(&text.as_bytes()[printed..]);
            let _ = stderr.flush();
            printed = text.len();
        }
    }
}
