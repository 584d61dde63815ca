//! Baseline checks for observed search results.
//!
//! Evaluation is pure: the same observed result and policy always produce
//! the same fragment, so everything here is testable without a browser.

use crate::models::{ChangePolicy, ObservedResult, ResultRow, DISPLAY_TITLE_CHARS};

/// Rows listed per date-threshold fragment; the rest are summarized.
pub const MAX_LISTED_ROWS: usize = 10;

/// Returns a Telegram HTML fragment describing how `observed` deviates from
/// `policy`, or `None` when the baseline holds.
pub fn evaluate(observed: &ObservedResult, policy: &ChangePolicy) -> Option<String> {
    match *policy {
        ChangePolicy::ExactCount { expected } => {
            let count = observed.count();
            if count == expected {
                return None;
            }
            Some(format!(
                "⚠️ <b>Change for query: {}</b>\nExpected: {}, found: {}\n",
                escape_html(&observed.query.text),
                expected,
                count
            ))
        }
        ChangePolicy::FutureDateThreshold { cutoff } => {
            let later: Vec<&ResultRow> = observed
                .rows
                .iter()
                .filter(|row| row.date.is_some_and(|date| date > cutoff))
                .collect();
            if later.is_empty() {
                return None;
            }

            let mut fragment = format!(
                "⚠️ <b>New dates for query: {}</b>\nFound: {}, dated after {}: {}\n",
                escape_html(&observed.query.text),
                observed.count(),
                cutoff.format("%d.%m.%Y"),
                later.len()
            );
            for row in later.iter().take(MAX_LISTED_ROWS) {
                fragment.push_str(&format!(
                    "• {} | {}\n",
                    row.display_date(),
                    escape_html(&row.display_title(DISPLAY_TITLE_CHARS))
                ));
            }
            if later.len() > MAX_LISTED_ROWS {
                fragment.push_str(&format!("… and {} more\n", later.len() - MAX_LISTED_ROWS));
            }
            Some(fragment)
        }
    }
}

impl ChangePolicy {
    pub fn evaluate(&self, observed: &ObservedResult) -> Option<String> {
        evaluate(observed, self)
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
