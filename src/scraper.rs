use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

/// One exclusive browser context. Dropping the session releases it.
pub trait BrowserSession {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Waits for `selector` to match. `Ok(false)` means the timeout elapsed;
    /// `Err` is reserved for the browser itself failing.
    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Clears the input matched by `selector` and types `text` into it.
    fn replace_input(&self, selector: &str, text: &str) -> Result<()>;

    fn click(&self, selector: &str) -> Result<()>;

    fn page_html(&self) -> Result<String>;
}

/// Hands out fresh sessions; nothing is shared between two of them.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn BrowserSession>>;
}

pub struct ChromeSessionFactory {
    config: ScraperConfig,
}

pub struct ChromeSession {
    // Held so the Chrome process lives as long as the tab; killed on drop.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSessionFactory {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(self.config.headless)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((self.config.window_width, self.config.window_height)))
            .ignore_certificate_errors(self.config.ignore_certificate_errors)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &self.config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Ok(launch_options)
    }
}

impl SessionFactory for ChromeSessionFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>> {
        let browser = Browser::new(self.launch_options()?)
            .map_err(|e| AppError::browser(format!("Failed to launch browser: {}", e)))?;

        match browser.get_version() {
            Ok(version) => debug!(product = %version.product, "Browser started"),
            Err(e) => debug!("Could not read browser version: {}", e),
        }

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(self.config.page_load_timeout());

        Ok(Box::new(ChromeSession {
            _browser: browser,
            tab,
        }))
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| AppError::browser(format!("Navigation failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| AppError::browser(format!("Page load failed: {}", e)))?;
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(true),
            Err(e) if e.downcast_ref::<headless_chrome::util::Timeout>().is_some() => Ok(false),
            Err(e) => Err(AppError::browser(format!(
                "Wait for selector '{}' failed: {}",
                selector, e
            ))),
        }
    }

    fn replace_input(&self, selector: &str, text: &str) -> Result<()> {
        let input = self
            .tab
            .find_element(selector)
            .map_err(|e| AppError::browser(format!("Input '{}' not found: {}", selector, e)))?;
        input
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(|e| AppError::browser(format!("Failed to clear input: {}", e)))?;
        input
            .type_into(text)
            .map_err(|e| AppError::browser(format!("Failed to type query: {}", e)))?;
        Ok(())
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.tab
            .find_element(selector)
            .and_then(|element| element.click().map(|_| ()))
            .map_err(|e| AppError::browser(format!("Failed to click '{}': {}", selector, e)))
    }

    fn page_html(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| AppError::browser(format!("Failed to get page content: {}", e)))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // The Chrome process itself goes down when `_browser` drops after this.
        if let Err(e) = self.tab.close(true) {
            debug!("Tab close failed: {}", e);
        }
        debug!("Browser session released");
    }
}
