use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default width used when a title is shown in a message or on the console.
pub const DISPLAY_TITLE_CHARS: usize = 50;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid ISO date regex"));

static DOTTED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b").expect("valid dotted date regex")
});

static WORDY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s+(\p{L}+)\.?,?\s+(\d{4})\b").expect("valid month-name date regex")
});

// Checked in order, so "мар" must precede "ма".
const MONTH_PREFIXES: &[(&str, u32)] = &[
    ("янв", 1),
    ("фев", 2),
    ("мар", 3),
    ("апр", 4),
    ("ма", 5),
    ("июн", 6),
    ("июл", 7),
    ("авг", 8),
    ("сен", 9),
    ("окт", 10),
    ("ноя", 11),
    ("дек", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// One row of the playbill search results, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// `None` when the date cell could not be parsed. The row still counts.
    pub date: Option<NaiveDate>,
    pub date_text: String,
    pub title: String,
}

impl ResultRow {
    pub fn new(date: Option<NaiveDate>, title: impl Into<String>) -> Self {
        let date_text = date.map(|d| d.format("%d.%m.%Y").to_string()).unwrap_or_default();
        Self {
            date,
            date_text,
            title: title.into(),
        }
    }

    /// Builds a row from the raw text of its date and title cells.
    pub fn from_cells(date_cell: &str, title_cell: &str) -> Self {
        let date_text = normalize_whitespace(date_cell);
        Self {
            date: parse_listing_date(&date_text),
            date_text,
            title: normalize_whitespace(title_cell),
        }
    }

    pub fn display_title(&self, max_chars: usize) -> String {
        if self.title.chars().count() <= max_chars {
            return self.title.clone();
        }
        let mut truncated: String = self.title.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }

    pub fn display_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%d.%m.%Y").to_string(),
            None if self.date_text.is_empty() => "?".to_string(),
            None => self.date_text.clone(),
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts a calendar date from a listing's date cell.
///
/// Accepts `2025-11-13`, `13.11.2025`, `13.11.25` and `13 ноября 2025`
/// (Russian or English month names) anywhere in the text, so weekday and
/// time decorations around the date are ignored.
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DOTTED_DATE.captures(text) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 { 2000 + year } else { year };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = WORDY_DATE.captures(text) {
        let day = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, month)| *month)
}
