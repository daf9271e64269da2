//! Portal API journeys
//!
//! Each journey is a sequential script of [`Check`]s against one
//! [`TestSession`]. A journey returns `Ok(true)` when it ran to the end,
//! `Ok(false)` when a missing field or failed step cut it short, and `Err`
//! only for local faults (e.g. building a request body).
//!
//! ## Journeys
//!
//! - Setup: health probe, static image assets
//! - Auth: admin login, forced first-login password change, student reset
//! - Admin: student records
//! - Content: downloads, notifications, resources, WiFi credentials

mod assets;
mod auth;
mod content;
mod downloads;
mod students;
mod wifi;

use anyhow::{bail, Result};
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tracing::debug;

use crate::config::{AdminCredentials, AppConfig};
use crate::harness::{Check, TestSession};
use crate::models::Scenario;

/// Everything a journey may read or update while it runs
pub struct ScenarioContext {
    pub session: TestSession,
    /// Admin credentials; `password` tracks the current one after a rotation
    pub admin: AdminCredentials,
    pub image_paths: Vec<String>,
}

impl ScenarioContext {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            session: TestSession::new(&config.backend_url)?,
            admin: config.admin.clone(),
            image_paths: config.image_paths.clone(),
        })
    }
}

/// Run one API journey
pub async fn run_scenario(scenario: Scenario, ctx: &mut ScenarioContext) -> Result<bool> {
    match scenario {
        Scenario::Health => auth::health(ctx).await,
        Scenario::ImageAssets => assets::image_assets(ctx).await,
        Scenario::AdminLogin => auth::admin_login(ctx).await,
        Scenario::FirstLogin => auth::first_login(ctx).await,
        Scenario::StudentManagement => students::student_management(ctx).await,
        Scenario::PasswordReset => students::password_reset(ctx).await,
        Scenario::Downloads => downloads::downloads(ctx).await,
        Scenario::Notifications => content::notifications(ctx).await,
        Scenario::Resources => content::resources(ctx).await,
        Scenario::Wifi => wifi::wifi(ctx).await,
        browser => bail!("{browser} drives the browser; use the `browser` command"),
    }
}

/// Unique login name: `<prefix>_<unix seconds>`
pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().timestamp())
}

/// Unique content title: `<prefix> <unix millis>`, so leftovers from earlier
/// runs never match
pub fn unique_title(prefix: &str) -> String {
    format!("{} {}", prefix, Utc::now().timestamp_millis())
}

/// Random national id in the `ID#####` form the portal expects
pub fn random_id_number() -> String {
    format!("ID{}", rand::rng().random_range(10000..100000))
}

/// A throwaway student account created through the admin API
#[derive(Clone, Debug)]
pub struct StudentFixture {
    pub id: String,
    pub username: String,
    pub password: String,
}

impl StudentFixture {
    /// Create a student. `None` when the create call or its `id` is missing;
    /// both cases are already recorded in the tally.
    pub async fn create(
        session: &mut TestSession,
        label: &str,
        prefix: &str,
        password: &str,
    ) -> Option<Self> {
        let username = unique_username(prefix);
        let body = json!({
            "username": username,
            "password": password,
            "full_name": "Test Student",
            "id_number": random_id_number(),
            "email": format!("{username}@example.com"),
            "phone": "0700123456",
        });

        let outcome = session
            .check(Check::post(label, "admin/students", 200).json(body).as_admin())
            .await;
        if !outcome.passed {
            return None;
        }

        let id = outcome.body.string_field("id");
        if !session.verify(
            &format!("{label}: id returned"),
            id.is_some(),
            "response has no student id",
        ) {
            return None;
        }

        debug!("Created student {}", username);
        Some(Self {
            id: id.unwrap_or_default(),
            username,
            password: password.to_string(),
        })
    }

    /// Log in as the student and return its token
    pub async fn login(&self, session: &mut TestSession, label: &str) -> Option<String> {
        login(session, label, &self.username, &self.password).await
    }

    /// Delete the student through the admin API
    pub async fn remove(&self, session: &mut TestSession, label: &str) -> bool {
        session
            .check(Check::delete(label, format!("admin/students/{}", self.id), 200).as_admin())
            .await
            .passed
    }
}

/// `POST auth/login`, verifying an `access_token` comes back
pub(crate) async fn login(
    session: &mut TestSession,
    label: &str,
    username: &str,
    password: &str,
) -> Option<String> {
    let outcome = session
        .check(
            Check::post(label, "auth/login", 200)
                .json(json!({"username": username, "password": password}))
                .anonymous(),
        )
        .await;
    if !outcome.passed {
        return None;
    }

    let token = outcome.body.string_field("access_token");
    if let Some(token) = &token {
        session.set_token(token.clone());
    }
    if session.verify(
        &format!("{label}: access_token returned"),
        token.is_some(),
        "response has no access_token",
    ) {
        token
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckStatus;

    #[test]
    fn test_unique_username_and_id_number() {
        let name = unique_username("teststudent");
        assert!(name.starts_with("teststudent_"));
        assert!(name["teststudent_".len()..].parse::<i64>().is_ok());

        let title = unique_title("Test Resource");
        assert!(title.starts_with("Test Resource "));
        assert!(title["Test Resource ".len()..].parse::<i64>().is_ok());

        let id = random_id_number();
        assert_eq!(id.len(), 7);
        let n: u32 = id[2..].parse().unwrap();
        assert!((10000..100000).contains(&n));
    }

    #[tokio::test]
    async fn test_student_fixture_lifecycle() {
        let backend = fake::portal();
        let mut session = TestSession::new(backend.url()).unwrap();
        session.set_admin_token("admin-token");

        let student = StudentFixture::create(&mut session, "Create Student", "teststudent", "Test@123")
            .await
            .unwrap();
        assert_eq!(student.id, "stu-1");

        let token = student.login(&mut session, "Student Login").await;
        assert_eq!(token.as_deref(), Some("tok"));
        assert!(student.remove(&mut session, "Delete Student").await);

        let requests = backend.requests();
        let created = requests[0].json();
        assert_eq!(created["username"], student.username.as_str());
        assert_eq!(created["phone"], "0700123456");
        assert!(created["id_number"].as_str().unwrap().starts_with("ID"));
        assert_eq!(
            requests[0].header("Authorization").as_deref(),
            Some("Bearer admin-token")
        );
        assert_eq!(requests[2].url, "/api/admin/students/stu-1");
        assert!(session.tally().all_passed());
    }

    #[tokio::test]
    async fn test_student_fixture_without_id_short_circuits() {
        let backend = crate::testing::MockBackend::start(|_| {
            crate::testing::MockResponse::json(200, serde_json::json!({"username": "x"}))
        });
        let mut session = TestSession::new(backend.url()).unwrap();

        let student =
            StudentFixture::create(&mut session, "Create Student", "teststudent", "Test@123").await;

        assert!(student.is_none());
        let records = session.tally_mut().drain();
        assert_eq!(records.last().unwrap().status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn test_browser_scenarios_are_rejected() {
        let mut ctx = ScenarioContext::new(&AppConfig::default()).unwrap();
        assert!(run_scenario(Scenario::UiLoginForm, &mut ctx).await.is_err());
    }
}
