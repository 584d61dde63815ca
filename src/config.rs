use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::models::{ChangePolicy, QuerySpec};

pub const DEFAULT_SITE_URL: &str = "https://tce.by/search.html";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub scraper: ScraperConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
    pub queries: Vec<QueryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    pub input_selector: String,
    pub submit_selector: String,
    pub row_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Ceiling for the page and its search input to appear.
    pub page_load_timeout_secs: u64,
    /// Ceiling for the first result row; running out means zero results.
    pub results_timeout_secs: u64,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub chrome_path: Option<String>,
    pub ignore_certificate_errors: bool,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base_url: String,
    pub parse_mode: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file: String,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub text: String,
    #[serde(default)]
    pub expected_count: Option<usize>,
    #[serde(default)]
    pub cutoff_date: Option<NaiveDate>,
}

/// Flat variables for one query slot, e.g. `SEARCH_TEXT_2` / `EXPECTED_COUNT_2`.
struct LegacySlot {
    text_key: &'static str,
    count_key: &'static str,
    cutoff_key: &'static str,
    default_text: &'static str,
    default_count: usize,
    /// A present but blank text variable removes the slot instead of
    /// falling back to `default_text`.
    blank_text_drops_slot: bool,
}

const LEGACY_SLOTS: [LegacySlot; 2] = [
    LegacySlot {
        text_key: "SEARCH_TEXT",
        count_key: "EXPECTED_COUNT",
        cutoff_key: "CUTOFF_DATE",
        default_text: "Записки юного врача",
        default_count: 5,
        blank_text_drops_slot: false,
    },
    LegacySlot {
        text_key: "SEARCH_TEXT_2",
        count_key: "EXPECTED_COUNT_2",
        cutoff_key: "CUTOFF_DATE_2",
        default_text: "На чёрной",
        default_count: 4,
        blank_text_drops_slot: true,
    },
];

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SITE_URL.to_string(),
            input_selector: r#"input[name="tags"]"#.to_string(),
            submit_selector: "#reload".to_string(),
            row_selector: "#playbill tbody tr".to_string(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_secs: 20,
            results_timeout_secs: 10,
            headless: true,
            window_width: 1200,
            window_height: 800,
            chrome_path: None,
            ignore_certificate_errors: true,
        }
    }
}

impl ScraperConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.results_timeout_secs)
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: DEFAULT_TELEGRAM_API.to_string(),
            parse_mode: "HTML".to_string(),
            request_timeout_secs: 15,
        }
    }
}

// The bot token is a credential; keep it out of debug output.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base_url", &self.api_base_url)
            .field("parse_mode", &self.parse_mode)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            file: "playbill_monitor.log".to_string(),
            filter: "info".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn to_spec(&self) -> Result<QuerySpec, ConfigError> {
        if self.text.trim().is_empty() {
            return Err(ConfigError::Message("Query text must not be empty".into()));
        }
        let policy = match (self.expected_count, self.cutoff_date) {
            (Some(expected), None) => ChangePolicy::ExactCount { expected },
            (None, Some(cutoff)) => ChangePolicy::FutureDateThreshold { cutoff },
            (Some(_), Some(_)) => {
                return Err(ConfigError::Message(format!(
                    "Query '{}' sets both expected_count and cutoff_date; choose one",
                    self.text
                )));
            }
            (None, None) => {
                return Err(ConfigError::Message(format!(
                    "Query '{}' needs either expected_count or cutoff_date",
                    self.text
                )));
            }
        };
        Ok(QuerySpec::new(self.text.trim(), policy))
    }
}

impl AppConfig {
    /// Loads configuration from process-wide sources.
    ///
    /// `.env` is read first, then the optional TOML file (`config/default` when
    /// no path is given), then `PLAYBILL__*` variables, then the flat
    /// variables the monitor has always understood (`BOT_TOKEN`, `CHAT_ID`,
    /// `SEARCH_TEXT`, ...).
    pub fn from_env(config_file: Option<&Path>) -> crate::Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self::from_sources(config_file, |key| env::var(key).ok())?)
    }

    pub fn from_sources<F>(config_file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let builder = match config_file {
            Some(path) => Config::builder().add_source(File::from(path)),
            None => Config::builder().add_source(File::with_name("config/default").required(false)),
        };

        let s = builder
            .add_source(
                Environment::with_prefix("PLAYBILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_legacy_env(lookup)?;
        if config.queries.is_empty() {
            config.queries = default_queries();
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlays the flat legacy variables. Any non-blank query variable
    /// replaces the configured query list with the two legacy slots; an
    /// empty `SEARCH_TEXT_2` drops the second slot.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty("CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(url) = non_empty("URL") {
            self.site.url = url;
        }
        if let Some(chrome) = non_empty("CHROME_BIN").or_else(|| non_empty("CHROME_PATH")) {
            self.scraper.chrome_path = Some(chrome);
        }

        let drops_slot = |slot: &LegacySlot| slot.blank_text_drops_slot && lookup(slot.text_key).is_some();
        let touches_queries = LEGACY_SLOTS.iter().any(|slot| {
            non_empty(slot.text_key).is_some()
                || drops_slot(slot)
                || non_empty(slot.count_key).is_some()
                || non_empty(slot.cutoff_key).is_some()
        });
        if !touches_queries {
            return Ok(());
        }

        let mut queries = Vec::new();
        for slot in &LEGACY_SLOTS {
            let text = match non_empty(slot.text_key) {
                Some(text) => text,
                None if drops_slot(slot) => continue,
                None => slot.default_text.to_string(),
            };

            let expected_count = non_empty(slot.count_key)
                .map(|raw| {
                    raw.trim().parse::<usize>().map_err(|_| {
                        ConfigError::Message(format!("{} must be a row count, got '{}'", slot.count_key, raw))
                    })
                })
                .transpose()?;
            let cutoff_date = non_empty(slot.cutoff_key)
                .map(|raw| {
                    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                        ConfigError::Message(format!("{} must be YYYY-MM-DD, got '{}'", slot.cutoff_key, raw))
                    })
                })
                .transpose()?;

            let expected_count = match (expected_count, cutoff_date) {
                (None, None) => Some(slot.default_count),
                (count, _) => count,
            };

            queries.push(QueryConfig {
                text,
                expected_count,
                cutoff_date,
            });
        }
        self.queries = queries;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.site.url).is_err() {
            return Err(ConfigError::Message("Invalid site URL format".into()));
        }

        if Url::parse(&self.telegram.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid Telegram API base URL format".into()));
        }

        if self.scraper.page_load_timeout_secs == 0 || self.scraper.results_timeout_secs == 0 {
            return Err(ConfigError::Message("Scraper timeouts must be greater than 0".into()));
        }

        if self.scraper.results_timeout_secs >= self.scraper.page_load_timeout_secs {
            return Err(ConfigError::Message(
                "Scraper results_timeout_secs must be shorter than page_load_timeout_secs".into(),
            ));
        }

        if self.telegram.request_timeout_secs == 0 {
            return Err(ConfigError::Message("Telegram request timeout must be greater than 0".into()));
        }

        if self.queries.is_empty() {
            return Err(ConfigError::Message("At least one query must be configured".into()));
        }

        for query in &self.queries {
            query.to_spec()?;
        }

        Ok(())
    }

    pub fn query_specs(&self) -> Result<Vec<QuerySpec>, ConfigError> {
        self.queries.iter().map(QueryConfig::to_spec).collect()
    }
}

pub fn default_queries() -> Vec<QueryConfig> {
    LEGACY_SLOTS
        .iter()
        .map(|slot| QueryConfig {
            text: slot.default_text.to_string(),
            expected_count: Some(slot.default_count),
            cutoff_date: None,
        })
        .collect()
}
