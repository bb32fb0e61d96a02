use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::info;

use crate::scraper::PageDriver;

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Chrome binary; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,
}

/// Headless Chrome with a single tab.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .path(config.chrome_path.clone())
            .build()
            .map_err(|e| anyhow!("Invalid browser launch options: {}", e))?;

        if config.headless {
            info!("Running Chrome in headless mode (no GUI)");
        }
        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        let tab = browser.new_tab().context("Failed to open a browser tab")?;
        info!("Browser session initialized");

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for_elements(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .with_context(|| format!("Timed out after {:?} waiting for `{}`", timeout, selector))?;
        Ok(())
    }

    fn find_all(&mut self, selector: &str) -> Result<Vec<Result<String>>> {
        Ok(self
            .tab
            .find_elements(selector)?
            .iter()
            .map(|el| el.get_inner_text())
            .collect())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the Browser kills the Chrome process.
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = self.tab.close(false);
        drop(browser);
        closed.context("Failed to close browser tab")?;
        Ok(())
    }
}
