//! Scenario catalogue
//!
//! Every user journey the suite knows about, in execution order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// All end-to-end journeys against the portal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    // Setup (1-2)
    Health,
    ImageAssets,

    // Authentication (3-4)
    AdminLogin,
    FirstLogin,

    // Admin management (5-7)
    StudentManagement,
    PasswordReset,
    Downloads,

    // Student content (8-10)
    Notifications,
    Resources,
    Wifi,

    // Browser journeys (11-13)
    UiForcedPasswordChange,
    UiLoginForm,
    UiSessionLifecycle,
}

impl Scenario {
    /// Get scenario number (1-13)
    pub fn number(&self) -> u8 {
        match self {
            Scenario::Health => 1,
            Scenario::ImageAssets => 2,
            Scenario::AdminLogin => 3,
            Scenario::FirstLogin => 4,
            Scenario::StudentManagement => 5,
            Scenario::PasswordReset => 6,
            Scenario::Downloads => 7,
            Scenario::Notifications => 8,
            Scenario::Resources => 9,
            Scenario::Wifi => 10,
            Scenario::UiForcedPasswordChange => 11,
            Scenario::UiLoginForm => 12,
            Scenario::UiSessionLifecycle => 13,
        }
    }

    /// Get scenario display name
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Health => "Health Check",
            Scenario::ImageAssets => "Image Assets",
            Scenario::AdminLogin => "Admin Login",
            Scenario::FirstLogin => "First Login Password Change",
            Scenario::StudentManagement => "Student Management",
            Scenario::PasswordReset => "Password Reset Flow",
            Scenario::Downloads => "Downloads Management",
            Scenario::Notifications => "Notifications",
            Scenario::Resources => "Learning Resources",
            Scenario::Wifi => "WiFi Credentials",
            Scenario::UiForcedPasswordChange => "UI Forced Password Change",
            Scenario::UiLoginForm => "UI Login Form",
            Scenario::UiSessionLifecycle => "UI Session Lifecycle",
        }
    }

    /// Short identifier used on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Scenario::Health => "health",
            Scenario::ImageAssets => "images",
            Scenario::AdminLogin => "admin-login",
            Scenario::FirstLogin => "first-login",
            Scenario::StudentManagement => "students",
            Scenario::PasswordReset => "password-reset",
            Scenario::Downloads => "downloads",
            Scenario::Notifications => "notifications",
            Scenario::Resources => "resources",
            Scenario::Wifi => "wifi",
            Scenario::UiForcedPasswordChange => "ui-first-login",
            Scenario::UiLoginForm => "ui-login-form",
            Scenario::UiSessionLifecycle => "ui-session",
        }
    }

    /// Get scenario category
    pub fn category(&self) -> &'static str {
        match self {
            Scenario::Health | Scenario::ImageAssets => "Setup",
            Scenario::AdminLogin | Scenario::FirstLogin | Scenario::PasswordReset => "Auth",
            Scenario::StudentManagement | Scenario::Downloads | Scenario::Wifi => "Admin",
            Scenario::Notifications | Scenario::Resources => "Content",
            _ => "Browser",
        }
    }

    /// Whether the journey needs the stored admin token
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Scenario::FirstLogin
                | Scenario::StudentManagement
                | Scenario::PasswordReset
                | Scenario::Downloads
                | Scenario::Notifications
                | Scenario::Resources
                | Scenario::Wifi
        )
    }

    /// Whether the journey drives the browser UI rather than the API
    pub fn is_browser(&self) -> bool {
        self.category() == "Browser"
    }

    /// Get all scenarios
    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::Health,
            Scenario::ImageAssets,
            Scenario::AdminLogin,
            Scenario::FirstLogin,
            Scenario::StudentManagement,
            Scenario::PasswordReset,
            Scenario::Downloads,
            Scenario::Notifications,
            Scenario::Resources,
            Scenario::Wifi,
            Scenario::UiForcedPasswordChange,
            Scenario::UiLoginForm,
            Scenario::UiSessionLifecycle,
        ]
    }

    /// API journeys in execution order
    pub fn api() -> Vec<Scenario> {
        Self::all().into_iter().filter(|s| !s.is_browser()).collect()
    }

    /// Browser journeys in execution order
    pub fn browser() -> Vec<Scenario> {
        Self::all().into_iter().filter(|s| s.is_browser()).collect()
    }

    /// Parse from slug or number
    pub fn from_slug(s: &str) -> Option<Scenario> {
        let s = s.trim().to_lowercase();
        if let Ok(n) = s.parse::<u8>() {
            return Self::all().into_iter().find(|sc| sc.number() == n);
        }
        Self::all().into_iter().find(|sc| sc.slug() == s)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scenario {}: {}", self.number(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_numbers_follow_catalogue_order() {
        for (i, scenario) in Scenario::all().iter().enumerate() {
            assert_eq!(scenario.number() as usize, i + 1);
        }
    }

    #[test]
    fn test_from_slug() {
        assert_eq!(Scenario::from_slug("downloads"), Some(Scenario::Downloads));
        assert_eq!(Scenario::from_slug("3"), Some(Scenario::AdminLogin));
        assert_eq!(Scenario::from_slug(" WiFi "), Some(Scenario::Wifi));
        assert_eq!(Scenario::from_slug("unknown"), None);
        assert_eq!(Scenario::from_slug("14"), None);
    }

    #[test]
    fn test_api_and_browser_split() {
        assert_eq!(Scenario::api().len(), 10);
        assert_eq!(Scenario::browser().len(), 3);
        assert!(Scenario::browser().iter().all(|s| !s.requires_admin()));
    }

    #[test]
    fn test_admin_login_does_not_require_itself() {
        assert!(!Scenario::AdminLogin.requires_admin());
        assert!(Scenario::Downloads.requires_admin());
        assert!(!Scenario::Health.requires_admin());
    }
}
