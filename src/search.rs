use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{ScraperConfig, SiteConfig};
use crate::models::{ResultRow, SearchOutcome};
use crate::scraper::SessionFactory;
use crate::utils::error::{AppError, Result};

/// Runs one query against the playbill site.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> SearchOutcome;
}

#[derive(Clone)]
pub struct SearchClient {
    factory: Arc<dyn SessionFactory>,
    site: SiteConfig,
    page_load_timeout: Duration,
    results_timeout: Duration,
}

impl SearchClient {
    pub fn new(factory: Arc<dyn SessionFactory>, site: SiteConfig, scraper: &ScraperConfig) -> Self {
        Self {
            factory,
            site,
            page_load_timeout: scraper.page_load_timeout(),
            results_timeout: scraper.results_timeout(),
        }
    }

    /// Blocking search. Opens a session, uses it for this query only and
    /// drops it before returning, whichever way the search ends.
    pub fn search_blocking(&self, query: &str) -> SearchOutcome {
        let start_time = Instant::now();

        match self.fetch_rows(query) {
            Ok(rows) => {
                info!(
                    query,
                    rows = rows.len(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Search finished"
                );
                SearchOutcome::Rows(rows)
            }
            Err(AppError::SearchUnavailable { reason, .. }) => {
                warn!(query, %reason, "Search unavailable");
                SearchOutcome::Unavailable(reason)
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed");
                SearchOutcome::Unavailable(e.to_string())
            }
        }
    }

    fn fetch_rows(&self, query: &str) -> Result<Vec<ResultRow>> {
        let session = self.factory.open()?;

        session.navigate(&self.site.url)?;

        if !session.wait_for_element(&self.site.input_selector, self.page_load_timeout)? {
            return Err(AppError::SearchUnavailable {
                query: query.to_string(),
                reason: format!(
                    "search input '{}' did not appear within {}s",
                    self.site.input_selector,
                    self.page_load_timeout.as_secs()
                ),
            });
        }

        session.replace_input(&self.site.input_selector, query)?;
        session.click(&self.site.submit_selector)?;

        // The results table never renders for an empty result set.
        if !session.wait_for_element(&self.site.row_selector, self.results_timeout)? {
            info!(query, "No results -> 0");
            return Ok(Vec::new());
        }

        let html = session.page_html()?;
        extract_rows(&html, &self.site.row_selector)
    }
}

#[async_trait]
impl Searcher for SearchClient {
    async fn search(&self, query: &str) -> SearchOutcome {
        let client = self.clone();
        let query = query.to_string();

        tokio::task::spawn_blocking(move || client.search_blocking(&query))
            .await
            .unwrap_or_else(|e| SearchOutcome::Unavailable(format!("search task failed: {}", e)))
    }
}

/// Extracts every row matched by `row_selector`, in document order.
///
/// The first cell is the date, the second the title. Rows with missing
/// cells or unreadable dates are kept.
pub fn extract_rows(html: &str, row_selector: &str) -> Result<Vec<ResultRow>> {
    let document = Html::parse_document(html);
    let rows = Selector::parse(row_selector).map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector '{}': {:?}", row_selector, e),
    })?;
    let cells = Selector::parse("td").map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector 'td': {:?}", e),
    })?;

    let extracted: Vec<ResultRow> = document
        .select(&rows)
        .map(|row| {
            let texts: Vec<String> = row
                .select(&cells)
                .map(|cell| cell.text().collect::<Vec<_>>().join(" "))
                .collect();
            let date_cell = texts.first().map(String::as_str).unwrap_or("");
            let title_cell = texts.get(1).map(String::as_str).unwrap_or("");
            ResultRow::from_cells(date_cell, title_cell)
        })
        .collect();

    // Rows without a parsed date never pass a cutoff check.
    let mut unparsed = extracted
        .iter()
        .filter(|row| row.date.is_none() && !row.date_text.is_empty());
    if let Some(first) = unparsed.next() {
        warn!(
            unparsed = 1 + unparsed.count(),
            sample = %first.date_text,
            "Result rows with unrecognized dates"
        );
    }

    Ok(extracted)
}
