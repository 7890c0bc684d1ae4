//! Fact-anchor detection.
//!
//! Given the clause a citation closes, pick the span the citation most
//! plausibly supports: the numeric or date span nearest the citation, or
//! failing that the nearest run of capitalized words.

use regex_lite::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?(?:\s+\d{1,2}(?:st|nd|rd|th)?,?)?\s+\d{4}|Q[1-4]\s+\d{4}|\d{4}-\d{2}-\d{2})\b",
        )
        .expect("date pattern is valid")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:[$€£¥]\s?)?\d(?:[\d,]*\d)?(?:\.\d+)?(?:\s?(?:%|(?i:percent|trillion|billion|million|thousand|bn|mn)\b|[kKmMbB]\b|x\b))?",
        )
        .expect("number pattern is valid")
    })
}

fn proper_noun_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][\w&'-]*(?:\s+(?:of\s+|de\s+|&\s+)?[A-Z][\w&'-]*)*")
            .expect("proper noun pattern is valid")
    })
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[[^\[\]]*\]\([^\s)]*\)|`[^`]*`").expect("markup pattern is valid")
    })
}

/// Find the fact anchor in `clause`, as a byte range into it.
pub(crate) fn find_anchor(clause: &str) -> Option<Range<usize>> {
    let blocked: Vec<Range<usize>> = link_re().find_iter(clause).map(|m| m.range()).collect();
    let free = |r: &Range<usize>| !blocked.iter().any(|b| r.start < b.end && b.start < r.end);

    let dates: Vec<Range<usize>> = date_re()
        .find_iter(clause)
        .map(|m| m.range())
        .filter(|r| free(r))
        .collect();

    let mut numeric: Vec<Range<usize>> = number_re()
        .find_iter(clause)
        .map(|m| m.range())
        .filter(|r| free(r))
        .filter(|r| !dates.iter().any(|d| d.start <= r.start && r.end <= d.end))
        .filter(|r| !inside_word(clause, r))
        .collect();
    numeric.extend(dates);

    if let Some(best) = nearest(numeric) {
        return Some(best);
    }

    let nouns: Vec<Range<usize>> = proper_noun_re()
        .find_iter(clause)
        .map(|m| trim_possessive(clause, m.range()))
        .filter(|r| free(r))
        .filter(|r| !is_sentence_capital(clause, r))
        .collect();

    nearest(nouns)
}

/// Latest-ending candidate; on a tie the longer one.
fn nearest(candidates: Vec<Range<usize>>) -> Option<Range<usize>> {
    candidates
        .into_iter()
        .max_by(|a, b| a.end.cmp(&b.end).then(b.start.cmp(&a.start)))
}

/// Digits glued to letters (`H100`, `GPT4`, `COVID-19`) are names, not
/// figures.
fn inside_word(clause: &str, r: &Range<usize>) -> bool {
    let mut before = clause[..r.start].chars().rev();
    match before.next() {
        Some(c) if c.is_ascii_alphabetic() => true,
        Some('-') => before.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

fn trim_possessive(clause: &str, r: Range<usize>) -> Range<usize> {
    let text = &clause[r.clone()];
    for suffix in ["'s", "'"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return r.start..r.start + stripped.len();
            }
        }
    }
    r
}

/// A lone capitalized word opening the clause is usually just sentence
/// case. Words with inner capitals or digits (`OpenAI`, `X5`) still count.
fn is_sentence_capital(clause: &str, r: &Range<usize>) -> bool {
    let lead = clause[..r.start].trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '*' | '>' | '#' | '_' | '"' | '“')
    });
    if !lead.is_empty() {
        return false;
    }
    let word = &clause[r.clone()];
    if word.contains(char::is_whitespace) {
        return false;
    }
    !word
        .chars()
        .skip(1)
        .any(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
