//! Best-effort citation post-processing for research reports.
//!
//! Research models tend to cite in a trailing style: `claim. (source)` or
//! `claim ([title](url)).` This crate moves each such citation onto the fact
//! it supports, producing `[fact](url)`, and drops later citations that repeat
//! the same source for the same fact.
//!
//! The transform is pure and never fails. Anything it cannot interpret with
//! confidence is left exactly as it was and noted in the change-log.

mod anchor;
mod config;
mod result;
mod scanner;

pub use config::{RewriteOptions, SourceCitation};
pub use result::{Change, ChangeKind, Rewrite, SkipReason};

use scanner::{Scan, Target};
use std::collections::HashSet;

/// Rewrite citations with default options.
pub fn rewrite_citations(text: &str, sources: &[SourceCitation]) -> Rewrite {
    rewrite_citations_with(text, sources, &RewriteOptions::default())
}

/// Rewrite citations.
///
/// `sources` are citation spans known from response metadata (byte offsets
/// into `text`). A parenthetical that contains one of these spans is treated
/// as a citation of that source even when its text is not a recognisable
/// link. Spans outside the text are ignored.
pub fn rewrite_citations_with(
    text: &str,
    sources: &[SourceCitation],
    options: &RewriteOptions,
) -> Rewrite {
    let mut rewriter = Rewriter {
        sources,
        options,
        seen: HashSet::new(),
        changes: Vec::new(),
        rewritten: 0,
        deduplicated: 0,
    };

    let mut out = String::with_capacity(text.len());
    let mut offset = 0;
    let mut in_fence = false;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let body = raw.trim_end_matches(['\n', '\r']);
        let ending = &raw[body.len()..];

        let fence = body.trim_start();
        if fence.starts_with("```") || fence.starts_with("~~~") {
            in_fence = !in_fence;
            out.push_str(raw);
        } else if in_fence {
            out.push_str(raw);
        } else {
            out.push_str(&rewriter.rewrite_line(body, offset, index + 1));
            out.push_str(ending);
        }

        offset += raw.len();
    }

    Rewrite {
        text: out,
        rewritten: rewriter.rewritten,
        deduplicated: rewriter.deduplicated,
        changes: rewriter.changes,
    }
}

/// Normalize a URL for duplicate detection.
///
/// Drops the scheme, a leading `www.`, any fragment and trailing slashes, and
/// lowercases the host.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let rest = rest.split('#').next().unwrap_or(rest);
    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    format!("{}{}", host, path.trim_end_matches('/'))
}

/// Normalize an anchor for duplicate detection: lowercase alphanumerics
/// plus `.`, `%` and `$`.
pub fn normalize_anchor(anchor: &str) -> String {
    anchor
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '%' | '$'))
        .flat_map(char::to_lowercase)
        .collect()
}

struct Rewriter<'a> {
    sources: &'a [SourceCitation],
    options: &'a RewriteOptions,
    seen: HashSet<(String, String)>,
    changes: Vec<Change>,
    rewritten: usize,
    deduplicated: usize,
}

impl Rewriter<'_> {
    fn rewrite_line(&mut self, line: &str, line_offset: usize, line_no: usize) -> String {
        let mut out = String::with_capacity(line.len());
        // Copied up to here
        let mut cursor = 0;
        // Clauses never reach back past the previous citation
        let mut floor = 0;

        for scan in scanner::scan_line(line) {
            let paren = match scan {
                Scan::Closed(paren) => paren,
                Scan::Unclosed(pos) => {
                    if scanner::unclosed_citation(&line[pos..]) {
                        self.skip(line_no, SkipReason::Unbalanced, &line[pos..]);
                    }
                    continue;
                }
            };

            let url = match scanner::classify(paren.inner(line)) {
                Target::Link { url } | Target::Bare { url } => url,
                Target::Ambiguous => {
                    self.skip(line_no, SkipReason::Ambiguous, &line[paren.start..paren.end]);
                    floor = paren.end;
                    continue;
                }
                Target::Prose => {
                    let lo = line_offset + paren.start;
                    let hi = line_offset + paren.end;
                    match self.sources.iter().find(|s| s.within(lo, hi)) {
                        Some(source) => source.url.clone(),
                        None => continue,
                    }
                }
            };

            let head = &line[floor..paren.start];
            let gap_start = floor + head.trim_end().len();
            let claim_end = floor
                + head
                    .trim_end_matches(|c: char| c.is_whitespace() || ".,;:!?".contains(c))
                    .len();
            let clause_start = floor + sentence_start(&line[floor..claim_end]);
            let clause = &line[clause_start..claim_end];

            let Some(range) = anchor::find_anchor(clause) else {
                let context_start = clause_start.min(paren.start);
                self.skip(line_no, SkipReason::NoAnchor, &line[context_start..paren.end]);
                floor = paren.end;
                continue;
            };
            let anchor_start = clause_start + range.start;
            let anchor_end = clause_start + range.end;
            let anchor = &line[anchor_start..anchor_end];

            let key = (normalize_url(&url), normalize_anchor(anchor));
            if self.options.dedupe && self.seen.contains(&key) {
                out.push_str(&line[cursor..gap_start]);
                self.deduplicated += 1;
                self.changes.push(Change {
                    line: line_no,
                    kind: ChangeKind::Deduplicated {
                        anchor: anchor.to_string(),
                        url,
                    },
                });
            } else {
                out.push_str(&line[cursor..anchor_start]);
                out.push('[');
                out.push_str(anchor);
                out.push_str("](");
                out.push_str(&url);
                out.push(')');
                out.push_str(&line[anchor_end..gap_start]);
                self.seen.insert(key);
                self.rewritten += 1;
                self.changes.push(Change {
                    line: line_no,
                    kind: ChangeKind::Inlined {
                        anchor: anchor.to_string(),
                        url,
                    },
                });
            }

            cursor = paren.end;
            floor = paren.end;
        }

        out.push_str(&line[cursor..]);
        out
    }

    fn skip(&mut self, line_no: usize, reason: SkipReason, context: &str) {
        let snippet: String = context.chars().take(self.options.snippet_chars).collect();
        self.changes.push(Change {
            line: line_no,
            kind: ChangeKind::Skipped { reason, snippet },
        });
    }
}

/// Offset just past the last sentence break (`.`, `!` or `?` followed by
/// whitespace) in `text`, or 0.
fn sentence_start(text: &str) -> usize {
    let mut start = 0;
    let mut prev_terminal = false;
    for (i, c) in text.char_indices() {
        if prev_terminal && c.is_whitespace() {
            start = i;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }
    start
}
