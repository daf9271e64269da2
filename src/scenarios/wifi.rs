//! WiFi credential distribution

use anyhow::Result;
use serde_json::{json, Value};
use tracing::debug;

use super::{unique_username, ScenarioContext, StudentFixture};
use crate::harness::{Auth, Check, TestSession};
use crate::http::HttpMethod;

const STUDENT_PASSWORD: &str = "Test@123";

/// Current credentials, if the portal has any. Not counted.
async fn snapshot(session: &TestSession) -> Option<Value> {
    let response = session
        .probe(HttpMethod::Get, "admin/wifi", &Auth::Admin)
        .await?;
    if response.status_code != 200 {
        debug!("No WiFi credentials to restore ({})", response.status_code);
        return None;
    }
    let current = response.json()?;
    Some(json!({
        "network_name": current.get("network_name").cloned().unwrap_or(Value::Null),
        "password": current.get("password").cloned().unwrap_or(Value::Null),
        "connection_guide": current.get("connection_guide").cloned().unwrap_or(Value::Null),
    }))
}

/// Set credentials, read them back as admin and as a student, then restore
pub async fn wifi(ctx: &mut ScenarioContext) -> Result<bool> {
    let session = &mut ctx.session;
    let previous = snapshot(session).await;

    let network_name = unique_username("TWOEM-Test");
    let updated = session
        .check(
            Check::post("Update WiFi Credentials", "admin/wifi", 200)
                .json(json!({
                    "network_name": network_name,
                    "password": "WifiTest@123",
                    "connection_guide": "Select the network and enter the password.",
                }))
                .as_admin(),
        )
        .await;
    if !updated.passed {
        return Ok(false);
    }

    let admin_view = session
        .check(Check::get("Get WiFi Credentials", "admin/wifi", 200).as_admin())
        .await;
    if !admin_view.passed
        || !session.verify(
            "Admin sees updated network",
            admin_view.body.string_field("network_name").as_deref() == Some(network_name.as_str()),
            "network_name was not updated",
        )
    {
        return Ok(false);
    }

    let Some(student) =
        StudentFixture::create(session, "Create Student for WiFi Test", "wifitest", STUDENT_PASSWORD)
            .await
    else {
        return Ok(false);
    };
    let Some(token) = student.login(session, "Student Login").await else {
        return Ok(false);
    };

    let student_view = session
        .check(Check::get("Student WiFi Credentials", "student/wifi", 200).bearer(token))
        .await;
    if !student_view.passed
        || !session.verify(
            "Student sees updated network",
            student_view.body.string_field("network_name").as_deref()
                == Some(network_name.as_str()),
            "student view does not match the admin update",
        )
    {
        return Ok(false);
    }

    let mut restored = true;
    if let Some(previous) = previous {
        restored = session
            .check(
                Check::post("Restore WiFi Credentials", "admin/wifi", 200)
                    .json(previous)
                    .as_admin(),
            )
            .await
            .passed;
    }
    let removed = student.remove(session, "Delete WiFi Test Student").await;

    Ok(restored && removed)
}

#[cfg(test)]
mod tests {
    use super::super::fake;
    use super::*;
    use crate::config::AppConfig;
    use crate::testing::{MockBackend, MockResponse};
    use std::sync::{Arc, Mutex};

    fn context(url: String) -> ScenarioContext {
        let config = AppConfig {
            backend_url: url,
            ..AppConfig::default()
        };
        let mut ctx = ScenarioContext::new(&config).unwrap();
        ctx.session.set_admin_token("admin-token");
        ctx
    }

    /// Stores whatever is posted and serves it to both views
    fn wifi_portal(initial: Option<Value>) -> MockBackend {
        let stored = Arc::new(Mutex::new(initial));
        MockBackend::start(move |req| match (req.method.as_str(), req.url.as_str()) {
            ("POST", "/api/admin/wifi") => {
                *stored.lock().unwrap() = Some(req.json());
                MockResponse::json(200, json!({"message": "saved"}))
            }
            ("GET", "/api/admin/wifi") | ("GET", "/api/student/wifi") => {
                match stored.lock().unwrap().clone() {
                    Some(value) => MockResponse::json(200, value),
                    None => MockResponse::json(404, json!({"detail": "Not configured"})),
                }
            }
            _ => fake::respond(req),
        })
    }

    #[tokio::test]
    async fn test_wifi_update_and_restore() {
        let original = json!({
            "network_name": "TWOEM-Office",
            "password": "office-pass",
            "connection_guide": "Ask at reception",
        });
        let backend = wifi_portal(Some(original.clone()));
        let mut ctx = context(backend.url());

        assert!(wifi(&mut ctx).await.unwrap());
        assert!(ctx.session.tally().all_passed());

        let posts: Vec<Value> = backend
            .requests()
            .iter()
            .filter(|r| r.method == "POST" && r.url == "/api/admin/wifi")
            .map(|r| r.json())
            .collect();
        assert_eq!(posts.len(), 2);
        assert!(posts[0]["network_name"]
            .as_str()
            .unwrap()
            .starts_with("TWOEM-Test_"));
        assert_eq!(posts[1], original);
    }

    #[tokio::test]
    async fn test_wifi_without_previous_credentials_skips_restore() {
        let backend = wifi_portal(None);
        let mut ctx = context(backend.url());

        assert!(wifi(&mut ctx).await.unwrap());

        let requests = backend.requests();
        let posts = requests
            .iter()
            .filter(|r| r.method == "POST" && r.url == "/api/admin/wifi")
            .count();
        assert_eq!(posts, 1);
        // Six counted HTTP checks and four field assertions; the probe is not counted
        assert_eq!(requests.len(), 7);
        assert_eq!(ctx.session.tally().tests_run(), 10);
    }
}
