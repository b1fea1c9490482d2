//! Call-summary classification and call-date extraction.
//!
//! A message counts as a call summary when it opens with a `DD/MM/YY` or
//! `DD/MM/YYYY` token, ignoring any leading symbols (bullets, emoji,
//! punctuation) and whitespace. Nothing else in the text is inspected.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn leading_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 4-digit year tried first so DD/MM/YYYY is not cut short at DD/MM/YY.
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/(?:\d{4}|\d{2})\b").unwrap())
}

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{2}/\d{2}/(?:\d{4}|\d{2})\b").unwrap())
}

/// A classified call summary: the verbatim (trimmed) message text plus the
/// call date parsed from the first date token, or the processing date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub text: String,
    pub date: NaiveDate,
}

/// True when the text starts with a date token, modulo leading symbols.
pub fn is_call_summary(text: &str) -> bool {
    let rest = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_start();
    leading_date_re().is_match(rest)
}

/// Classify a message. Returns the trimmed text and its call date when the
/// message qualifies as a call summary; `None` otherwise.
pub fn classify(text: &str, today: NaiveDate) -> Option<CallSummary> {
    if !is_call_summary(text) {
        return None;
    }
    Some(CallSummary {
        text: text.trim().to_string(),
        date: extract_call_date(text, today),
    })
}

/// Find the first parseable date token anywhere in the text and normalize it
/// to a `NaiveDate`; fall back to `today` when no token parses.
pub fn extract_call_date(text: &str, today: NaiveDate) -> NaiveDate {
    for m in date_token_re().find_iter(text) {
        if let Some(date) = parse_date_token(m.as_str()) {
            return date;
        }
    }
    today
}

fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let year_len = token.rsplit('/').next().map(str::len)?;
    let format = if year_len == 4 { "%d/%m/%Y" } else { "%d/%m/%y" };
    NaiveDate::parse_from_str(token, format).ok()
}
