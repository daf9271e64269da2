//! WebDriver session wrapper
//!
//! Every wait is a bounded condition poll; nothing sleeps for a fixed time
//! and hopes the page caught up.

use anyhow::{Context, Result};
use chrono::Utc;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BrowserConfig};
use crate::harness::Tally;

/// Browser automation errors
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to start WebDriver session at {url}: {reason}")]
    Session { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    WaitTimeout { what: String, timeout_ms: u64 },

    #[error("WebDriver command failed: {0}")]
    Command(String),
}

fn command_error(e: impl std::fmt::Display) -> anyhow::Error {
    BrowserError::Command(e.to_string()).into()
}

/// Something on the page to look for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// CSS selector
    Css(String),
    /// `<button>` whose visible text contains the string
    Button(String),
    /// `<a>` whose visible text contains the string
    Link(String),
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Target::Css(selector.into())
    }

    pub fn button(text: impl Into<String>) -> Self {
        Target::Button(text.into())
    }

    pub fn link(text: impl Into<String>) -> Self {
        Target::Link(text.into())
    }

    fn xpath(tag: &str, text: &str) -> String {
        format!("//{tag}[contains(normalize-space(.), '{text}')]")
    }

    /// Locator string and whether it is CSS
    fn selector(&self) -> (bool, String) {
        match self {
            Target::Css(selector) => (true, selector.clone()),
            Target::Button(text) => (false, Self::xpath("button", text)),
            Target::Link(text) => (false, Self::xpath("a", text)),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Css(selector) => write!(f, "'{selector}'"),
            Target::Button(text) => write!(f, "button '{text}'"),
            Target::Link(text) => write!(f, "link '{text}'"),
        }
    }
}

/// Poll `probe` until it yields a value or `timeout` elapses
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if start.elapsed() >= timeout {
            return None;
        }
        sleep(interval).await;
    }
}

/// W3C capabilities for Chrome and Firefox drivers
pub fn capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let size = format!("--window-size={},{}", config.window_width, config.window_height);
    let mut chrome_args = vec![size, "--no-sandbox".to_string()];
    let mut firefox_args = Vec::new();
    if config.headless {
        chrome_args.push("--headless=new".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({"args": chrome_args}));
    caps.insert("moz:firefoxOptions".to_string(), json!({"args": firefox_args}));
    caps
}

/// `<dir>/<timestamp>_<name>.png`
pub fn screenshot_path(dir: &Path, name: &str) -> PathBuf {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    dir.join(format!("{}_{}.png", Utc::now().format("%Y%m%d_%H%M%S%3f"), slug))
}

/// One browser, one frontend, one tally
pub struct BrowserSession {
    client: Client,
    frontend_url: String,
    wait_timeout: Duration,
    poll_interval: Duration,
    screenshot_dir: Option<PathBuf>,
    tally: Tally,
}

impl BrowserSession {
    /// Start a WebDriver session
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        info!("Connecting to WebDriver at {}", config.webdriver_url);

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities(&config.browser));
        let client = builder
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| BrowserError::Session {
                url: config.webdriver_url.clone(),
                reason: e.to_string(),
            })?;

        client
            .set_window_size(config.browser.window_width, config.browser.window_height)
            .await
            .map_err(command_error)?;

        let screenshot_dir = match &config.browser.screenshot_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create screenshot directory: {dir}"))?;
                Some(PathBuf::from(dir))
            }
            None => None,
        };

        Ok(Self {
            client,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            wait_timeout: Duration::from_millis(config.browser.wait_timeout_ms),
            poll_interval: Duration::from_millis(config.browser.poll_interval_ms),
            screenshot_dir,
            tally: Tally::new(),
        })
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    /// Record a UI assertion
    pub fn verify(&mut self, name: &str, condition: bool, failure: impl Into<String>) -> bool {
        self.tally.verify(name, "ui", condition, failure)
    }

    /// Record a deliberately skipped UI step
    pub fn skip(&mut self, name: &str, reason: impl Into<String>) {
        self.tally.skip(name, "ui", reason);
    }

    /// Navigate to a frontend path
    pub async fn open(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.frontend_url, path);
        debug!("Navigating to {}", url);
        self.client.goto(&url).await.map_err(command_error)
    }

    pub async fn current_url(&self) -> Result<String> {
        let url = self.client.current_url().await.map_err(command_error)?;
        Ok(url.to_string())
    }

    /// Wait until the current URL satisfies `accept`; returns that URL
    pub async fn wait_for_url<F>(&self, what: &str, accept: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        let client = &self.client;
        let accept = &accept;
        let found = poll_until(self.wait_timeout, self.poll_interval, || async move {
            let url = client.current_url().await.ok()?.to_string();
            accept(&url).then_some(url)
        })
        .await;

        match found {
            Some(url) => {
                debug!("URL reached {}: {}", what, url);
                Ok(url)
            }
            None => {
                warn!("Timed out waiting for {}", what);
                Err(self.timeout(what))
            }
        }
    }

    async fn find(&self, target: &Target) -> Option<Element> {
        let (is_css, selector) = target.selector();
        let locator = if is_css {
            Locator::Css(&selector)
        } else {
            Locator::XPath(&selector)
        };
        self.client.find(locator).await.ok()
    }

    /// Wait until the target exists and is displayed
    pub async fn wait_for(&self, target: &Target) -> Result<Element> {
        let found = poll_until(self.wait_timeout, self.poll_interval, || async move {
            let element = self.find(target).await?;
            element
                .is_displayed()
                .await
                .ok()
                .filter(|shown| *shown)
                .map(|_| element)
        })
        .await;
        found.ok_or_else(|| self.timeout(&target.to_string()))
    }

    /// Replace an input's value
    pub async fn fill(&self, target: &Target, value: &str) -> Result<()> {
        let element = self.wait_for(target).await?;
        element.clear().await.map_err(command_error)?;
        element.send_keys(value).await.map_err(command_error)
    }

    pub async fn click(&self, target: &Target) -> Result<()> {
        let element = self.wait_for(target).await?;
        element.click().await.map_err(command_error)
    }

    /// Visible text of the target, if it is on the page
    pub async fn text(&self, target: &Target) -> Option<String> {
        let element = self.find(target).await?;
        element.text().await.ok()
    }

    /// Attribute of the target, if it is on the page
    pub async fn attr(&self, target: &Target, name: &str) -> Option<String> {
        let element = self.find(target).await?;
        element.attr(name).await.ok().flatten()
    }

    /// Run a script body in the page (`return ...;` to get a value)
    pub async fn eval(&self, script: &str) -> Result<Value> {
        self.client
            .execute(script, Vec::new())
            .await
            .map_err(command_error)
    }

    /// Save a PNG when a screenshot directory is configured
    pub async fn screenshot(&self, name: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.screenshot_dir else {
            return Ok(None);
        };
        let png = self.client.screenshot().await.map_err(command_error)?;
        let path = screenshot_path(dir, name);
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write screenshot: {}", path.display()))?;
        println!("📸 Screenshot saved: {}", path.display());
        Ok(Some(path))
    }

    /// End the WebDriver session
    pub async fn close(self) -> Result<()> {
        self.client.close().await.map_err(command_error)
    }

    fn timeout(&self, what: &str) -> anyhow::Error {
        BrowserError::WaitTimeout {
            what: what.to_string(),
            timeout_ms: self.wait_timeout.as_millis() as u64,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_poll_until_returns_first_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value = poll_until(Duration::from_secs(2), Duration::from_millis(5), || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                (n == 3).then_some(n)
            }
        })
        .await;

        assert_eq!(value, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_gives_up_after_timeout() {
        let start = Instant::now();
        let value: Option<()> =
            poll_until(Duration::from_millis(50), Duration::from_millis(10), || async {
                None
            })
            .await;

        assert!(value.is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_target_selectors() {
        assert_eq!(Target::css("#username").selector(), (true, "#username".to_string()));
        assert_eq!(
            Target::button("Forgot Password?").selector(),
            (
                false,
                "//button[contains(normalize-space(.), 'Forgot Password?')]".to_string()
            )
        );
        assert_eq!(Target::link("Students").to_string(), "link 'Students'");
    }

    #[test]
    fn test_capabilities_follow_headless_flag() {
        let headless = capabilities(&BrowserConfig::default());
        let args = headless["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--window-size=1920,1080"));

        let headed = capabilities(&BrowserConfig {
            headless: false,
            ..BrowserConfig::default()
        });
        assert!(headed["moz:firefoxOptions"]["args"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_screenshot_path() {
        let path = screenshot_path(Path::new("/tmp/shots"), "Login Page");
        let file = path.file_name().unwrap().to_str().unwrap();
        assert!(path.starts_with("/tmp/shots"));
        assert!(file.ends_with("_login_page.png"));
    }

    #[test]
    fn test_browser_error_messages() {
        let err = BrowserError::WaitTimeout {
            what: "admin dashboard".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for admin dashboard"
        );
    }
}
