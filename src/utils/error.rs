use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Search unavailable for '{query}': {reason}")]
    SearchUnavailable { query: String, reason: String },

    #[error("Configuration missing: {key}")]
    ConfigurationMissing { key: String },

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn browser(err: impl std::fmt::Display) -> Self {
        AppError::Browser(err.to_string())
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
