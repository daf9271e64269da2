//! Configuration module
//!
//! Layered configuration: built-in defaults, then a YAML/JSON config file,
//! then `TWOEM_E2E_*` environment variables, then command-line flags.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend root; API calls go to `{backend_url}/api/...`
    pub backend_url: String,

    /// Frontend root used by browser journeys
    pub frontend_url: String,

    /// WebDriver endpoint (chromedriver, geckodriver, selenium)
    pub webdriver_url: String,

    /// Admin credentials
    pub admin: AdminCredentials,

    /// Static images expected under the backend root
    pub image_paths: Vec<String>,

    /// Browser journey settings
    pub browser: BrowserConfig,

    /// Where run summaries are stored (defaults to the user data dir)
    pub results_dir: Option<String>,

    /// Default output format
    pub output_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8001".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            admin: AdminCredentials::default(),
            image_paths: default_image_paths(),
            browser: BrowserConfig::default(),
            results_dir: None,
            output_format: "table".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the effective configuration: file (explicit or discovered) then env
    pub fn resolve(explicit_file: Option<&str>) -> Result<Self> {
        let env = EnvConfig::load();

        let file = match explicit_file.or(env.config_file.as_deref()) {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::load_default()?,
        };

        let mut config = file.app;
        config.apply_env(&env);
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = env.base_url() {
            self.backend_url = url;
        }
        if let Some(url) = &env.frontend_url {
            self.frontend_url = url.clone();
        }
        if let Some(url) = &env.webdriver_url {
            self.webdriver_url = url.clone();
        }
        if let Some(username) = &env.admin_username {
            self.admin.username = username.clone();
        }
        if let Some(password) = &env.admin_password {
            self.admin.password = password.clone();
        }
        if let Some(password) = &env.new_admin_password {
            self.admin.new_password = password.clone();
        }
        if let Some(format) = &env.format {
            self.output_format = format.clone();
        }
    }
}

/// Admin account used to drive the suite
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCredentials {
    pub username: String,

    /// Password the account logs in with
    pub password: String,

    /// Password set when the portal forces a first-login change
    pub new_password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "Twoemweb@2020".to_string(),
            new_password: "NewAdminPass123!".to_string(),
        }
    }
}

/// Browser journey configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the browser without a window
    pub headless: bool,

    pub window_width: u32,

    pub window_height: u32,

    /// Upper bound for every condition wait
    pub wait_timeout_ms: u64,

    /// Interval between condition polls
    pub poll_interval_ms: u64,

    /// Directory for PNG screenshots; none are taken when unset
    pub screenshot_dir: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            wait_timeout_ms: 10_000,
            poll_interval_ms: 250,
            screenshot_dir: None,
        }
    }
}

fn default_image_paths() -> Vec<String> {
    [
        "ecitizen",
        "itax",
        "digital_printing",
        "cyber_services",
        "other_services",
        "gallery1",
        "gallery2",
        "gallery3",
        "twoem",
    ]
    .iter()
    .map(|name| format!("/images/{name}.jpg"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8001");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, "Twoemweb@2020");
        assert_eq!(config.image_paths.len(), 9);
        assert_eq!(config.image_paths[0], "/images/ecitizen.jpg");
    }

    #[test]
    fn test_browser_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_width, 1920);
        assert!(config.screenshot_dir.is_none());
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            base_url: Some("https://portal.example.com".to_string()),
            admin_password: Some("Secret!1".to_string()),
            ..Default::default()
        };
        config.apply_env(&env);

        assert_eq!(config.backend_url, "https://portal.example.com");
        assert_eq!(config.admin.password, "Secret!1");
        assert_eq!(config.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: AppConfig =
            serde_yaml::from_str("backend_url: http://10.0.0.5:8001\nadmin:\n  password: x\n")
                .unwrap();
        assert_eq!(config.backend_url, "http://10.0.0.5:8001");
        assert_eq!(config.admin.password, "x");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.browser.wait_timeout_ms, 10_000);
    }
}
