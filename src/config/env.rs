//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "TWOEM_E2E";

/// Backend URL variable shared with the portal frontend build
const FRONTEND_BACKEND_VAR: &str = "REACT_APP_BACKEND_URL";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Backend URL from TWOEM_E2E_BASE_URL
    pub base_url: Option<String>,
    /// Backend URL from REACT_APP_BACKEND_URL
    pub frontend_backend_url: Option<String>,
    /// Frontend URL from TWOEM_E2E_FRONTEND_URL
    pub frontend_url: Option<String>,
    /// WebDriver URL from TWOEM_E2E_WEBDRIVER_URL
    pub webdriver_url: Option<String>,
    /// Admin username from TWOEM_E2E_ADMIN_USERNAME
    pub admin_username: Option<String>,
    /// Admin password from TWOEM_E2E_ADMIN_PASSWORD
    pub admin_password: Option<String>,
    /// Rotated admin password from TWOEM_E2E_NEW_ADMIN_PASSWORD
    pub new_admin_password: Option<String>,
    /// Output format from TWOEM_E2E_FORMAT
    pub format: Option<String>,
    /// Verbose from TWOEM_E2E_VERBOSE
    pub verbose: Option<bool>,
    /// Config file from TWOEM_E2E_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            base_url: get_env("BASE_URL"),
            frontend_backend_url: env::var(FRONTEND_BACKEND_VAR).ok(),
            frontend_url: get_env("FRONTEND_URL"),
            webdriver_url: get_env("WEBDRIVER_URL"),
            admin_username: get_env("ADMIN_USERNAME"),
            admin_password: get_env("ADMIN_PASSWORD"),
            new_admin_password: get_env("NEW_ADMIN_PASSWORD"),
            format: get_env("FORMAT"),
            verbose: get_env_bool("VERBOSE"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Backend URL: the prefixed variable wins over the frontend's one
    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.frontend_backend_url.clone())
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.base_url.is_some()
            || self.frontend_backend_url.is_some()
            || self.frontend_url.is_some()
            || self.webdriver_url.is_some()
            || self.admin_username.is_some()
            || self.admin_password.is_some()
            || self.new_admin_password.is_some()
            || self.format.is_some()
            || self.verbose.is_some()
            || self.config_file.is_some()
    }

    /// Print current environment configuration. Passwords are masked.
    pub fn print_summary(&self) {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********");
        println!("Environment Configuration:");
        if !self.has_any() {
            println!("  (no {ENV_PREFIX}_* or {FRONTEND_BACKEND_VAR} variables set)");
            return;
        }
        println!("  {}_BASE_URL:           {:?}", ENV_PREFIX, self.base_url);
        println!(
            "  {}:      {:?}",
            FRONTEND_BACKEND_VAR, self.frontend_backend_url
        );
        println!("  {}_FRONTEND_URL:       {:?}", ENV_PREFIX, self.frontend_url);
        println!("  {}_WEBDRIVER_URL:      {:?}", ENV_PREFIX, self.webdriver_url);
        println!("  {}_ADMIN_USERNAME:     {:?}", ENV_PREFIX, self.admin_username);
        println!(
            "  {}_ADMIN_PASSWORD:     {:?}",
            ENV_PREFIX,
            mask(&self.admin_password)
        );
        println!(
            "  {}_NEW_ADMIN_PASSWORD: {:?}",
            ENV_PREFIX,
            mask(&self.new_admin_password)
        );
        println!("  {}_FORMAT:             {:?}", ENV_PREFIX, self.format);
        println!("  {}_VERBOSE:            {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_CONFIG:             {:?}", ENV_PREFIX, self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all TWOEM_E2E environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BASE_URL            Backend root URL");
    println!("  {FRONTEND_BACKEND_VAR}         Backend root URL (fallback)");
    println!("  {ENV_PREFIX}_FRONTEND_URL        Frontend root URL for browser journeys");
    println!("  {ENV_PREFIX}_WEBDRIVER_URL       WebDriver endpoint");
    println!("  {ENV_PREFIX}_ADMIN_USERNAME      Admin username");
    println!("  {ENV_PREFIX}_ADMIN_PASSWORD      Admin password");
    println!("  {ENV_PREFIX}_NEW_ADMIN_PASSWORD  Password set on forced first-login change");
    println!("  {ENV_PREFIX}_FORMAT              Output format (table, json, csv, summary)");
    println!("  {ENV_PREFIX}_VERBOSE             Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_CONFIG              Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URL=https://portal.example.com");
    println!("  twoem-e2e run");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sets variables for the lifetime of the guard
    struct EnvGuard {
        previous: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let previous = vars
                .iter()
                .map(|(k, _)| (k.to_string(), env::var(k).ok()))
                .collect();
            for (k, v) in vars {
                env::set_var(k, v);
            }
            Self { previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.previous {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.base_url().is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_prefixed_base_url_wins() {
        let config = EnvConfig {
            base_url: Some("http://a".to_string()),
            frontend_backend_url: Some("http://b".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url().as_deref(), Some("http://a"));

        let fallback = EnvConfig {
            frontend_backend_url: Some("http://b".to_string()),
            ..Default::default()
        };
        assert_eq!(fallback.base_url().as_deref(), Some("http://b"));
        assert!(fallback.has_any());
    }

    #[test]
    fn test_env_load() {
        let _guard = EnvGuard::set(&[
            ("TWOEM_E2E_WEBDRIVER_URL", "http://selenium:4444"),
            ("TWOEM_E2E_VERBOSE", "yes"),
            ("TWOEM_E2E_ADMIN_USERNAME", "   "),
        ]);

        let config = EnvConfig::load();
        assert_eq!(config.webdriver_url.as_deref(), Some("http://selenium:4444"));
        assert_eq!(config.verbose, Some(true));
        assert!(config.admin_username.is_none());
    }
}
