//! Parenthetical discovery and citation-target classification.

use regex_lite::Regex;
use std::sync::OnceLock;

/// A balanced `( ... )` group on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Parenthetical {
    /// Byte offset of `(`.
    pub start: usize,
    /// Byte offset one past `)`.
    pub end: usize,
}

impl Parenthetical {
    pub fn inner<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start + 1..self.end - 1]
    }
}

/// A top-level opening parenthesis found while scanning a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    Closed(Parenthetical),
    /// `(` at this offset never closes on the line.
    Unclosed(usize),
}

/// What a parenthetical points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Exactly one Markdown link.
    Link { url: String },
    /// Exactly one bare URL.
    Bare { url: String },
    /// Links or URLs mixed with other content.
    Ambiguous,
    /// Ordinary prose.
    Prose,
}

/// Schemeless hosts are only accepted on these TLDs unless a path follows.
const BARE_HOST_TLDS: &[&str] = &[
    "com", "org", "net", "io", "ai", "co", "gov", "edu", "dev", "app", "info", "news", "uk", "de",
    "fr", "eu", "us", "ca", "jp", "cn", "in", "au",
];

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[([^\[\]]*)\]\(([^\s()]+(?:\([^\s()]*\)[^\s()]*)?)\)$")
            .expect("link pattern is valid")
    })
}

fn scheme_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<?((?i:https?://|www\.)[^\s<>]+)>?$").expect("url pattern is valid")
    })
}

fn bare_host_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.([A-Za-z]{2,}))(/[^\s]*)?$")
            .expect("host pattern is valid")
    })
}

/// Find top-level parentheticals on a single line.
///
/// Link targets (`](...)`) and inline code spans are skipped. Only ASCII
/// delimiters are inspected, so byte offsets are always char boundaries.
pub(crate) fn scan_line(line: &str) -> Vec<Scan> {
    let bytes = line.as_bytes();
    let mut found = Vec::new();
    let mut in_code = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => in_code = !in_code,
            b'(' if !in_code => {
                let close = matching_close(bytes, i);
                if i > 0 && bytes[i - 1] == b']' {
                    // Markdown link target, not a parenthetical
                    if let Some(close) = close {
                        i = close + 1;
                        continue;
                    }
                } else {
                    match close {
                        Some(close) => {
                            found.push(Scan::Closed(Parenthetical {
                                start: i,
                                end: close + 1,
                            }));
                            i = close + 1;
                            continue;
                        }
                        None => found.push(Scan::Unclosed(i)),
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    found
}

fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, b) in bytes[open..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Classify the content between the parentheses.
pub(crate) fn classify(inner: &str) -> Target {
    let trimmed = inner.trim();

    if let Some(caps) = link_re().captures(trimmed) {
        return Target::Link {
            url: caps[2].to_string(),
        };
    }

    if let Some(url) = bare_url(trimmed) {
        return Target::Bare { url };
    }

    if looks_like_citation(trimmed) {
        Target::Ambiguous
    } else {
        Target::Prose
    }
}

/// Whether text mentions a link or URL at all.
pub(crate) fn looks_like_citation(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("](") || lower.contains("http://") || lower.contains("https://") || lower.contains("www.")
}

/// Whether the tail of a line starting at an unclosed `(` opens a citation:
/// it mentions a link, or its first word is a bare URL.
pub(crate) fn unclosed_citation(tail: &str) -> bool {
    let first = tail
        .trim_start_matches('(')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| ",;:!?".contains(c));
    looks_like_citation(tail) || bare_url(first).is_some()
}

fn bare_url(text: &str) -> Option<String> {
    if let Some(caps) = scheme_url_re().captures(text) {
        return Some(caps[1].to_string());
    }

    let caps = bare_host_re().captures(text)?;
    let tld = caps[2].to_ascii_lowercase();
    let has_path = caps.get(3).is_some();
    if has_path || BARE_HOST_TLDS.contains(&tld.as_str()) {
        Some(caps[0].to_string())
    } else {
        None
    }
}
