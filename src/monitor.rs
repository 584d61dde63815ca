use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::{ObservedResult, QuerySpec, RunOutcome, SearchOutcome};
use crate::notifiers::Notifier;
use crate::policy::{escape_html, evaluate};
use crate::search::Searcher;

/// One monitoring pass over the configured queries.
///
/// Searches run one after another. A failed search ends the run with a
/// single error message; otherwise every deviation goes out together in one
/// message, and a run without deviations sends nothing.
pub struct Monitor {
    searcher: Arc<dyn Searcher>,
    notifier: Arc<dyn Notifier>,
    site_url: String,
}

impl Monitor {
    pub fn new(searcher: Arc<dyn Searcher>, notifier: Arc<dyn Notifier>, site_url: impl Into<String>) -> Self {
        Self {
            searcher,
            notifier,
            site_url: site_url.into(),
        }
    }

    pub async fn run(&self, queries: &[QuerySpec]) -> RunOutcome {
        let run_id = Uuid::new_v4();
        self.run_inner(queries)
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_inner(&self, queries: &[QuerySpec]) -> RunOutcome {
        info!(
            queries = queries.len(),
            notifier = self.notifier.name(),
            "Monitoring run started"
        );
        let mut outcome = RunOutcome::default();

        for query in queries {
            match self.searcher.search(&query.text).await {
                SearchOutcome::Rows(rows) => {
                    info!(query = %query.text, rows = rows.len(), baseline = %query.policy, "Observed");
                    outcome.observed.push(ObservedResult::new(query.clone(), rows));
                }
                SearchOutcome::Unavailable(reason) => {
                    error!(query = %query.text, %reason, "Search failed, aborting run");
                    outcome.observed.clear();
                    outcome.fatal_error = Some(format!("{}: {}", query.text, reason));
                    let message = error_message(&query.text, &reason);
                    outcome.delivered = Some(self.notifier.deliver(&message).await);
                    return outcome;
                }
            }
        }

        outcome.fragments = outcome
            .observed
            .iter()
            .filter_map(|observed| evaluate(observed, &observed.query.policy))
            .collect();

        if outcome.fragments.is_empty() {
            info!("All queries match their baselines");
            return outcome;
        }

        info!(deviations = outcome.fragments.len(), "Deviations found");
        let message = report_message(&outcome.fragments, &self.site_url);
        outcome.delivered = Some(self.notifier.deliver(&message).await);
        outcome
    }
}

/// Longest text Telegram's `sendMessage` accepts.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

// Room kept for the "more deviations" line when fragments are dropped.
const OMITTED_NOTE_RESERVE: usize = 64;

/// Joins the fragments and appends the site URL. Whole trailing fragments
/// are dropped when the result would exceed [`MESSAGE_CHAR_LIMIT`].
pub fn report_message(fragments: &[String], site_url: &str) -> String {
    let full = format!("{}\n\n{}", fragments.join("\n"), site_url);
    if full.chars().count() <= MESSAGE_CHAR_LIMIT {
        return full;
    }

    let budget = MESSAGE_CHAR_LIMIT.saturating_sub(site_url.chars().count() + OMITTED_NOTE_RESERVE);
    let mut body = String::new();
    let mut used = 0;
    let mut kept = 0;
    for fragment in fragments {
        let len = fragment.chars().count() + usize::from(kept > 0);
        if used + len > budget {
            break;
        }
        if kept > 0 {
            body.push('\n');
        }
        body.push_str(fragment);
        used += len;
        kept += 1;
    }

    warn!(kept, total = fragments.len(), "Report too long, dropping trailing deviations");
    format!(
        "{}\n… and {} more deviations not shown\n\n{}",
        body,
        fragments.len() - kept,
        site_url
    )
}

pub fn error_message(query: &str, reason: &str) -> String {
    format!(
        "❗ Monitoring error: {}: {}",
        escape_html(query),
        escape_html(reason)
    )
}
