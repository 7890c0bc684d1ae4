//! Writing reports to disk

use chrono::{DateTime, NaiveDate, Utc};
use research_citations::{Rewrite, RewriteOptions};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{render_markdown, slug, ResearchReport};
use crate::error::Result;
use crate::model::estimate_cost;

/// Where a report is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Directory; the file name is derived from the topic and date
    Dir(PathBuf),
    /// Exact file path
    File(PathBuf),
}

impl DownloadTarget {
    /// Existing directories and paths without a `.md` extension are
    /// directories; anything else is a file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if path.is_dir() || !is_markdown {
            DownloadTarget::Dir(path)
        } else {
            DownloadTarget::File(path)
        }
    }

    fn resolve(&self, report: &ResearchReport, today: NaiveDate) -> PathBuf {
        match self {
            DownloadTarget::Dir(dir) => dir.join(file_name(report.topic.as_deref(), today)),
            DownloadTarget::File(path) => path.clone(),
        }
    }
}

/// `<slug>-research-<YYYY-MM-DD>.md`
pub fn file_name(topic: Option<&str>, date: NaiveDate) -> String {
    format!(
        "{}-research-{}.md",
        slug(topic.unwrap_or_default()),
        date.format("%Y-%m-%d")
    )
}

/// Token and cost accounting of a finished job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    /// Wall-clock time from remote creation to download
    pub duration_seconds: Option<u64>,
    pub cost_usd: f64,
}

impl UsageStats {
    pub fn for_report(report: &ResearchReport, now: DateTime<Utc>) -> Self {
        let usage = report.usage;
        Self {
            model: report.model.clone(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total(),
            duration_seconds: report
                .created_at
                .and_then(|created| (now - created).to_std().ok())
                .map(|d| d.as_secs()),
            cost_usd: estimate_cost(&report.model, usage.input_tokens, usage.output_tokens),
        }
    }

    /// Duration in minutes, one decimal.
    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration_seconds
            .map(|secs| (secs as f64 / 6.0).round() / 10.0)
    }
}

/// Result of a download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    /// Unique source URLs listed in the artifact
    pub sources_count: usize,
    pub usage: UsageStats,
    /// Citation rewrite log, when inlining was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<Rewrite>,
}

/// Render `report` and write it under `target`, replacing any existing
/// file. Parent directories are created.
pub fn download(
    mut report: ResearchReport,
    target: &DownloadTarget,
    inline: Option<&RewriteOptions>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<DownloadOutcome> {
    let rewrite = inline.map(|options| report.inline_citations(options));

    let path = target.resolve(&report, today);
    write_file(&path, &render_markdown(&report, today))?;

    let outcome = DownloadOutcome {
        sources_count: report.sources().len(),
        usage: UsageStats::for_report(&report, now),
        path,
        rewrite,
    };
    tracing::info!(
        id = %report.id,
        path = %outcome.path.display(),
        sources = outcome.sources_count,
        "report written"
    );
    Ok(outcome)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        tracing::debug!(path = %path.display(), "overwriting existing report");
    }
    fs::write(path, contents)?;
    Ok(())
}
