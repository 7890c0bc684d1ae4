//! Markdown rendering

use chrono::NaiveDate;

use super::ResearchReport;

const SLUG_MAX_CHARS: usize = 50;

/// Render the report as a Markdown document with YAML frontmatter and a
/// numbered sources list.
pub fn render_markdown(report: &ResearchReport, date: NaiveDate) -> String {
    let topic = report.topic.as_deref().unwrap_or("Unknown");
    let mut lines = vec![
        "---".to_string(),
        format!("title: \"Research: {}\"", escape_quoted(topic)),
        format!("date: {}", date.format("%Y-%m-%d")),
        format!("model: {}", report.model),
        format!("template: {}", report.template.as_deref().unwrap_or("unknown")),
        format!("response_id: {}", report.id),
        "---".to_string(),
        String::new(),
        report.text.clone(),
        String::new(),
    ];

    let sources = report.sources();
    if !sources.is_empty() {
        lines.extend(["---", "", "## Sources", ""].map(String::from));
        for (i, source) in sources.iter().enumerate() {
            lines.push(format!(
                "{}. [{}]({})",
                i + 1,
                source.title.as_deref().unwrap_or("Untitled"),
                source.url
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// File-name-safe form of a topic.
///
/// Lowercased, punctuation dropped, whitespace runs collapsed to `-`,
/// capped at 50 characters. Falls back to `research`.
pub fn slug(topic: &str) -> String {
    let kept: String = topic
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-'))
        .collect();

    let slug: String = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(SLUG_MAX_CHARS)
        .collect();

    if slug.is_empty() {
        "research".to_string()
    } else {
        slug
    }
}
