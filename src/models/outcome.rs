use serde::{Deserialize, Serialize};

use super::{QuerySpec, ResultRow};

/// What a single search produced. Zero rows is `Rows(vec![])`, never `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    Rows(Vec<ResultRow>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedResult {
    pub query: QuerySpec,
    pub rows: Vec<ResultRow>,
}

impl ObservedResult {
    pub fn new(query: QuerySpec, rows: Vec<ResultRow>) -> Self {
        Self { query, rows }
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Deviation descriptions in query order. Always empty when `fatal_error` is set.
    pub fragments: Vec<String>,
    pub fatal_error: Option<String>,
    pub observed: Vec<ObservedResult>,
    /// `None` when the run had nothing to report.
    pub delivered: Option<bool>,
}

impl RunOutcome {
    pub fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }
}
