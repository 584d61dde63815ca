pub mod config;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod notifiers;
pub mod policy;
pub mod scraper;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{ChangePolicy, ObservedResult, QuerySpec, ResultRow, RunOutcome, SearchOutcome};
pub use monitor::Monitor;
pub use notifiers::Notifier;
pub use search::{SearchClient, Searcher};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
