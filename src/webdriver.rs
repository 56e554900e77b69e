use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tempfile::TempDir;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::driver::{Locator, PageDriver};
use crate::types::{SelectOption, TableRow};
use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserType {
    /// Default WebDriver URL for this browser type
    pub fn get_webdriver_url(&self) -> String {
        match self {
            BrowserType::Firefox => "http://localhost:4444".to_string(),
            BrowserType::Chrome => "http://localhost:9515".to_string(),
        }
    }

    pub fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

/// WebDriver capabilities for one session
pub fn capabilities(
    browser_type: BrowserType,
    headless: bool,
    user_data_dir: Option<&std::path::Path>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();

    match browser_type {
        BrowserType::Firefox => {
            let mut args = Vec::new();
            if headless {
                args.push("--headless".to_string());
            }
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        BrowserType::Chrome => {
            let mut args = vec!["--no-sandbox".to_string()];
            if headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                // Prevent shared memory issues in CI containers
                args.push("--disable-dev-shm-usage".to_string());
            }
            args.push("--lang=ja-JP".to_string());
            if let Some(dir) = user_data_dir {
                args.push(format!("--user-data-dir={}", dir.display()));
            }
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
    }
    caps
}

/// Picks the option by label through the site's jQuery `selecter` plugin when it is
/// loaded, else sets the value and raises `change` directly
const SCRIPT_SELECT: &str = r#"
    const [sid, label] = arguments;
    const el = document.getElementById(sid);
    if (!el) return 'NO_ELEM';
    const opt = Array.from(el.options || []).find(o => (o.textContent || '').trim() === label);
    if (!opt) return 'NO_OPT';
    try {
        const $ = window.jQuery;
        if ($ && typeof $(el).selecter === 'function') {
            $(el).selecter('select', opt.value);
        } else {
            el.value = opt.value;
            el.dispatchEvent(new Event('change', { bubbles: true }));
        }
        return 'OK';
    } catch (e) {
        return 'ERR:' + e;
    }
"#;

const READ_OPTIONS: &str = r#"
    const el = arguments[0];
    return Array.from(el.options || []).map((o, i) => ({
        index: i,
        value: o.value,
        label: (o.textContent || '').trim()
    }));
"#;

const READ_TABLE: &str = r#"
    const table = document.querySelector('table');
    if (!table) return null;
    const text = e => (e.innerText || e.textContent || '').trim();
    return Array.from(table.rows).map(tr => ({
        cells: Array.from(tr.cells).map(c => ({
            text: text(c),
            links: Array.from(c.querySelectorAll('a')).map(a => ({
                text: text(a),
                href: a.getAttribute('href')
            })),
            buttons: Array.from(
                c.querySelectorAll("button, input[type='button'], input[type='submit']")
            ).map(b => ({ text: b.tagName === 'INPUT' ? (b.value || '').trim() : text(b), href: null }))
        }))
    }));
"#;

/// Browser session driven over WebDriver
pub struct WebDriverPage {
    client: Client,
    browser_type: BrowserType,
    timeouts: Timeouts,
    // Chrome refuses to share a profile directory; removed when the page is dropped
    _profile_dir: Option<TempDir>,
}

impl WebDriverPage {
    /// Start a session, launching the WebDriver server when none is running
    pub async fn connect(
        browser_type: BrowserType,
        headless: bool,
        timeouts: Timeouts,
    ) -> Result<Self> {
        info!("Connecting to {:?} WebDriver", browser_type);

        let webdriver_url = GLOBAL_WEBDRIVER_MANAGER
            .ensure_driver(&browser_type)
            .await?;

        if !Self::is_webdriver_running(&webdriver_url).await {
            let driver_name = browser_type.driver_name();
            anyhow::bail!(
                "Cannot connect to {} WebDriver at {}.\n\
                Please ensure {} is installed and on PATH:\n\
                  For Firefox: geckodriver --port 4444\n\
                  For Chrome: chromedriver --port 9515",
                driver_name,
                webdriver_url,
                driver_name
            );
        }

        let profile_dir = match browser_type {
            BrowserType::Chrome => Some(
                tempfile::Builder::new()
                    .prefix("seatwatch-chrome-")
                    .tempdir()?,
            ),
            BrowserType::Firefox => None,
        };
        let caps = capabilities(
            browser_type,
            headless,
            profile_dir.as_ref().map(|d| d.path()),
        );

        debug!("Connecting to WebDriver at {}", webdriver_url);

        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("Session is already started")
                    || error_str.contains("session not created")
                {
                    // A driver left over from a crashed run; restart it once
                    info!("WebDriver appears to be in a bad state, attempting recovery...");
                    GLOBAL_WEBDRIVER_MANAGER.kill_driver(&browser_type);
                    sleep(std::time::Duration::from_millis(500)).await;

                    let new_url = GLOBAL_WEBDRIVER_MANAGER
                        .ensure_driver(&browser_type)
                        .await
                        .context("Failed to restart WebDriver after recovery")?;
                    ClientBuilder::rustls()
                        .capabilities(caps)
                        .connect(&new_url)
                        .await
                        .context("Failed to connect to WebDriver after restart")?
                } else {
                    return Err(e).context("Failed to connect to WebDriver");
                }
            }
        };

        Ok(WebDriverPage {
            client,
            browser_type,
            timeouts,
            _profile_dir: profile_dir,
        })
    }

    pub fn browser_type(&self) -> BrowserType {
        self.browser_type
    }

    pub(crate) async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);
        match reqwest::get(&status_url).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let found = if let Some(css) = locator.as_css() {
            self.client.find_all(fantoccini::Locator::Css(css)).await
        } else {
            let xpath = locator
                .to_xpath()
                .with_context(|| format!("Locator {} has no XPath form", locator))?;
            self.client.find_all(fantoccini::Locator::XPath(&xpath)).await
        };
        found.with_context(|| format!("Failed to query {}", locator))
    }

    async fn first(&self, locator: &Locator) -> Result<Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("Element not found: {}", locator))
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client
            .goto(url)
            .await
            .with_context(|| format!("Failed to load {}", url))?;
        self.wait_for_load().await
    }

    async fn wait_for_load(&self) -> Result<()> {
        let deadline = Instant::now() + self.timeouts.page_load;
        loop {
            match self
                .client
                .execute("return document.readyState === 'complete';", vec![])
                .await
            {
                Ok(val) if val.as_bool().unwrap_or(false) => return Ok(()),
                // Mid-navigation the script can fail; keep polling
                Ok(_) | Err(_) => {}
            }
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "Page did not finish loading within {:?}",
                    self.timeouts.page_load
                );
            }
            sleep(self.timeouts.poll).await;
        }
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.find_all(locator).await?.len())
    }

    async fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        match self.find_all(locator).await?.into_iter().next() {
            Some(element) => Ok(element.is_displayed().await?),
            None => Ok(false),
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let element = self.first(locator).await?;
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("Clicking {}", locator);
        self.first(locator).await?.click().await?;
        Ok(())
    }

    async fn check(&self, locator: &Locator) -> Result<()> {
        let element = self.first(locator).await?;
        if !element.is_selected().await? {
            element.click().await?;
        }
        Ok(())
    }

    async fn select_options(&self, control: &Locator) -> Result<Vec<SelectOption>> {
        let Some(element) = self.find_all(control).await?.into_iter().next() else {
            return Ok(Vec::new());
        };
        let value = self
            .client
            .execute(READ_OPTIONS, vec![serde_json::to_value(&element)?])
            .await
            .with_context(|| format!("Failed to read options of {}", control))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn select_option(&self, control: &Locator, option: &SelectOption) -> Result<()> {
        self.first(control)
            .await?
            .select_by_index(option.index)
            .await
            .with_context(|| format!("Failed to select '{}' in {}", option.label, control))?;
        Ok(())
    }

    async fn script_select(&self, element_id: &str, label: &str) -> Result<()> {
        let result = self
            .client
            .execute(SCRIPT_SELECT, vec![json!(element_id), json!(label)])
            .await?;
        match result.as_str() {
            Some("OK") => Ok(()),
            Some(other) => anyhow::bail!("#{} '{}': {}", element_id, label, other),
            None => anyhow::bail!("#{} '{}': unexpected result {}", element_id, label, result),
        }
    }

    async fn first_table_rows(&self) -> Result<Option<Vec<TableRow>>> {
        let value = self
            .client
            .execute(READ_TABLE, vec![])
            .await
            .context("Failed to read the results table")?;
        Ok(serde_json::from_value(value)?)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().close().await?;
        Ok(())
    }
}
