// Integration tests for the playbill watcher
// These tests drive the public API with scripted browsers and channels

pub mod search_client_tests;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use playbill_watcher::config::SiteConfig;
use playbill_watcher::notifiers::Notifier;
use playbill_watcher::scraper::{BrowserSession, SessionFactory};
use playbill_watcher::utils::error::{AppError, Result};
use playbill_watcher::ResultRow;

pub const SITE_URL: &str = "https://tce.by/search.html";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` rows with distinct dates in November 2025.
pub fn rows(count: usize) -> Vec<ResultRow> {
    (0..count)
        .map(|i| ResultRow::new(Some(date(2025, 11, 1 + i as u32)), "Записки юного врача"))
        .collect()
}

pub fn rows_dated(dates: &[NaiveDate]) -> Vec<ResultRow> {
    dates
        .iter()
        .map(|d| ResultRow::new(Some(*d), "На чёрной лестнице"))
        .collect()
}

/// Notifier that remembers every message it was handed.
#[derive(Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    accept: bool,
}

impl RecordingNotifier {
    pub fn accepting() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            accept: true,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, text: &str) -> bool {
        self.messages.lock().unwrap().push(text.to_string());
        self.accept
    }
}

/// How a scripted browser behaves for one search.
#[derive(Clone)]
pub struct Script {
    pub fail_open: bool,
    pub fail_navigate: bool,
    pub input_appears: bool,
    pub rows_appear: bool,
    pub fail_results_wait: bool,
    pub html: String,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_open: false,
            fail_navigate: false,
            input_appears: true,
            rows_appear: true,
            fail_results_wait: false,
            html: String::new(),
        }
    }
}

/// Session factory whose sessions log every call into a shared journal.
#[derive(Clone)]
pub struct ScriptedFactory {
    pub script: Script,
    pub site: SiteConfig,
    journal: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            site: SiteConfig::default(),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.journal().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl SessionFactory for ScriptedFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if self.script.fail_open {
            return Err(AppError::Browser("Failed to launch browser: no chrome".to_string()));
        }
        self.journal.lock().unwrap().push("open".to_string());
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            site: self.site.clone(),
            journal: Arc::clone(&self.journal),
        }))
    }
}

pub struct ScriptedSession {
    script: Script,
    site: SiteConfig,
    journal: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl BrowserSession for ScriptedSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{}", url));
        if self.script.fail_navigate {
            return Err(AppError::Browser("Navigation failed: net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool> {
        self.record(format!("wait:{}:{}", selector, timeout.as_secs()));
        if selector == self.site.input_selector {
            return Ok(self.script.input_appears);
        }
        if self.script.fail_results_wait {
            return Err(AppError::Browser("target crashed".to_string()));
        }
        Ok(self.script.rows_appear)
    }

    fn replace_input(&self, selector: &str, text: &str) -> Result<()> {
        self.record(format!("type:{}:{}", selector, text));
        Ok(())
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click:{}", selector));
        Ok(())
    }

    fn page_html(&self) -> Result<String> {
        self.record("content".to_string());
        Ok(self.script.html.clone())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.record("close".to_string());
    }
}
