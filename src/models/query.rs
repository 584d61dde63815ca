use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Baseline a query's results are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChangePolicy {
    /// The search must return exactly `expected` rows.
    ExactCount { expected: usize },
    /// No row may be dated after `cutoff`.
    FutureDateThreshold { cutoff: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub text: String,
    pub policy: ChangePolicy,
}

impl QuerySpec {
    pub fn new(text: impl Into<String>, policy: ChangePolicy) -> Self {
        Self {
            text: text.into(),
            policy,
        }
    }

    pub fn exact_count(text: impl Into<String>, expected: usize) -> Self {
        Self::new(text, ChangePolicy::ExactCount { expected })
    }

    pub fn future_date(text: impl Into<String>, cutoff: NaiveDate) -> Self {
        Self::new(text, ChangePolicy::FutureDateThreshold { cutoff })
    }
}

impl std::fmt::Display for ChangePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangePolicy::ExactCount { expected } => write!(f, "exactly {} rows", expected),
            ChangePolicy::FutureDateThreshold { cutoff } => write!(f, "no rows after {}", cutoff),
        }
    }
}
