//! Work-item history merging.
//!
//! Two upstream shapes are accepted (structured entries and the legacy
//! blank-line separated string). Both normalize to [`HistoryEntry`], are
//! stripped to plain text and rendered newest first.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::contract::HtmlUtility;
use crate::model::{HistoryEntry, RawHistory};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
];

const DATE_ONLY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

fn block_separator() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("static pattern compiles"))
}

/// Parses the timestamp formats seen in history payloads. Naive timestamps are
/// UTC; a bare date is midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_ONLY_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Splits one legacy block on the first `" - "` and the next `": "`.
///
/// Authors or text containing those delimiters mis-split; callers rely on
/// the legacy format never doing so.
pub fn parse_legacy_block(block: &str) -> HistoryEntry {
    let block = block.trim();
    let (date, rest) = block.split_once(" - ").unwrap_or(("", block));
    let (author, text) = rest.split_once(": ").unwrap_or(("", rest));
    HistoryEntry {
        created_date: date.trim().to_owned(),
        created_by: author.trim().to_owned(),
        text: text.trim().to_owned(),
    }
}

pub fn normalize(raw: &RawHistory) -> Vec<HistoryEntry> {
    let entries: Vec<HistoryEntry> = match raw {
        RawHistory::Entries(entries) => entries.clone(),
        RawHistory::Legacy(text) => block_separator()
            .split(text)
            .filter(|block| !block.trim().is_empty())
            .map(parse_legacy_block)
            .collect(),
    };
    entries.into_iter().filter(|e| !e.is_blank()).collect()
}

pub struct HistoryMerger<'a> {
    html: &'a dyn HtmlUtility,
    offset: FixedOffset,
}

impl<'a> HistoryMerger<'a> {
    pub fn new(html: &'a dyn HtmlUtility, offset: FixedOffset) -> Self {
        Self { html, offset }
    }

    pub fn format_date(&self, raw: &str) -> (Option<DateTime<Utc>>, String) {
        match parse_timestamp(raw) {
            Some(ts) => (
                Some(ts),
                ts.with_timezone(&self.offset).format(DATE_FORMAT).to_string(),
            ),
            None => {
                if !raw.trim().is_empty() {
                    debug!(date = raw, "Unparsable history date, keeping raw value");
                }
                (None, raw.trim().to_owned())
            }
        }
    }

    /// Renders history lines newest first; equal timestamps keep input order
    /// and unparsable dates sort after every parsed one.
    pub fn merge(&self, raw: &RawHistory) -> Vec<String> {
        let mut lines: Vec<(Option<DateTime<Utc>>, usize, String)> = normalize(raw)
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let text = self.html.html_to_plain_text(&entry.text, true);
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                let (timestamp, date) = self.format_date(&entry.created_date);
                let author = entry.created_by.trim();
                let prefix = match (date.is_empty(), author.is_empty()) {
                    (false, false) => format!("{date} - {author}"),
                    (false, true) => date,
                    (true, false) => author.to_owned(),
                    (true, true) => String::new(),
                };
                let line = if prefix.is_empty() {
                    text.to_owned()
                } else {
                    format!("{prefix}: {text}")
                };
                Some((timestamp, index, line))
            })
            .collect();

        lines.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        lines.into_iter().map(|(_, _, line)| line).collect()
    }
}
