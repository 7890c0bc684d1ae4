//! Rewrite result and change-log types.

use serde::{Deserialize, Serialize};

/// Why a citation-looking parenthetical was left untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// No number, date or proper noun precedes the citation.
    NoAnchor,
    /// The parenthetical holds several links or links mixed with prose.
    Ambiguous,
    /// The opening parenthesis is never closed on its line.
    Unbalanced,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoAnchor => "NO_ANCHOR",
            SkipReason::Ambiguous => "AMBIGUOUS",
            SkipReason::Unbalanced => "UNBALANCED",
        }
    }
}

/// What happened to one citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// The trailing citation became an inline link around `anchor`.
    Inlined { anchor: String, url: String },
    /// The citation repeated an earlier one and was removed.
    Deduplicated { anchor: String, url: String },
    /// The parenthetical was left as is.
    Skipped { reason: SkipReason, snippet: String },
}

/// Change-log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    /// 1-based line number in the input.
    pub line: usize,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

/// Output of a rewrite pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rewrite {
    /// Rewritten text.
    pub text: String,
    /// Citations turned into inline links.
    pub rewritten: usize,
    /// Citations removed as duplicates.
    pub deduplicated: usize,
    /// Per-citation log in input order.
    pub changes: Vec<Change>,
}

impl Rewrite {
    /// Number of citation-looking parentheticals left untouched.
    pub fn skipped(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c.kind, ChangeKind::Skipped { .. }))
            .count()
    }

    /// Whether the text differs from the input.
    pub fn changed(&self) -> bool {
        self.rewritten + self.deduplicated > 0
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One-line operator summary.
    pub fn to_human(&self) -> String {
        format!(
            "{} citation(s) inlined, {} duplicate(s) removed, {} left untouched",
            self.rewritten,
            self.deduplicated,
            self.skipped()
        )
    }
}
