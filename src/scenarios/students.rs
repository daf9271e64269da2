//! Student records and the admin-approved password reset

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use super::{login, ScenarioContext, StudentFixture};
use crate::harness::{Auth, Check, ResponseBody, TestSession};

const STUDENT_PASSWORD: &str = "Test@123";
const RESET_OLD_PASSWORD: &str = "OldPass@123";
const RESET_NEW_PASSWORD: &str = "NewPass@123";

/// Create, list and delete one student
pub async fn student_management(ctx: &mut ScenarioContext) -> Result<bool> {
    let session = &mut ctx.session;
    let Some(student) =
        StudentFixture::create(session, "Create Student", "teststudent", STUDENT_PASSWORD).await
    else {
        return Ok(false);
    };
    println!("Created test student: {}", student.username);

    let listing = session
        .check(Check::get("Get All Students", "admin/students", 200).as_admin())
        .await;
    if listing.passed {
        session.verify(
            "Student listing contains created student",
            listing.body.find_item("id", &student.id).is_some()
                || listing.body.find_item("username", &student.username).is_some(),
            format!("{} not in listing", student.username),
        );
    }

    Ok(student.remove(session, "Delete Student").await)
}

/// Reset request, admin approval, one-time code, then logins with both
/// passwords
pub async fn password_reset(ctx: &mut ScenarioContext) -> Result<bool> {
    let session = &mut ctx.session;
    let Some(student) = StudentFixture::create(
        session,
        "Create Student for Reset Test",
        "resettest",
        RESET_OLD_PASSWORD,
    )
    .await
    else {
        return Ok(false);
    };

    let completed = reset_flow(session, &student).await;

    if completed {
        student.remove(session, "Delete Reset Test Student").await;
    }
    Ok(completed)
}

async fn reset_flow(session: &mut TestSession, student: &StudentFixture) -> bool {
    let request = session
        .check(
            Check::post("Request Password Reset", "auth/forgot-password", 200)
                .json(json!({"username": student.username}))
                .anonymous(),
        )
        .await;
    if !request.passed {
        return false;
    }

    let pending = session
        .check(Check::get("Get Password Reset Requests", "admin/password-resets", 200).as_admin())
        .await;
    if !pending.passed {
        return false;
    }

    let request_id = pending
        .body
        .find_item("student_username", &student.username)
        .and_then(|item| ResponseBody::Json(item.clone()).string_field("id"));
    if !session.verify(
        "Reset request listed",
        request_id.is_some(),
        format!("no reset request for {}", student.username),
    ) {
        return false;
    }
    let request_id = request_id.unwrap_or_default();

    let approval = session
        .check(
            Check::put(
                "Approve Password Reset",
                format!("admin/password-resets/{request_id}/approve"),
                200,
            )
            .json(json!({}))
            .as_admin(),
        )
        .await;
    if !approval.passed {
        return false;
    }

    let otp_code = approval.body.string_field("otp_code");
    if !session.verify(
        "One-time code issued",
        otp_code.is_some(),
        "approval response has no otp_code",
    ) {
        return false;
    }
    let otp_code = otp_code.unwrap_or_default();
    debug!("Generated OTP for {}", student.username);

    let reset = session
        .check(
            Check::post("Reset Password with OTP", "auth/reset-password", 200)
                .json(json!({
                    "username": student.username,
                    "reset_code": otp_code,
                    "new_password": RESET_NEW_PASSWORD,
                }))
                .anonymous(),
        )
        .await;
    if !reset.passed {
        return false;
    }

    if login(
        session,
        "Login with New Password",
        &student.username,
        RESET_NEW_PASSWORD,
    )
    .await
    .is_none()
    {
        return false;
    }

    session
        .check(
            Check::post("Login with Old Password Rejected", "auth/login", 401)
                .json(json!({"username": student.username, "password": student.password}))
                .auth(Auth::Anonymous),
        )
        .await
        .passed
}

#[cfg(test)]
mod tests {
    use super::super::fake;
    use super::*;
    use crate::config::AppConfig;
    use crate::models::CheckStatus;
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

    #[tokio::test]
    async fn test_student_management() {
        let backend = fake::portal();
        let mut ctx = context(backend.url());

        assert!(student_management(&mut ctx).await.unwrap());
        assert!(ctx.session.tally().all_passed());

        let methods: Vec<String> = backend.requests().iter().map(|r| r.method.clone()).collect();
        assert_eq!(methods, vec!["POST", "GET", "DELETE"]);
    }

    #[tokio::test]
    async fn test_student_management_create_failure_stops() {
        let backend = MockBackend::start(|_| MockResponse::json(400, json!({"detail": "exists"})));
        let mut ctx = context(backend.url());

        assert!(!student_management(&mut ctx).await.unwrap());
        assert_eq!(backend.requests().len(), 1);
    }

    fn reset_portal() -> MockBackend {
        let requested = Arc::new(Mutex::new(String::new()));
        MockBackend::start(move |req| match (req.method.as_str(), req.url.as_str()) {
            ("POST", "/api/auth/forgot-password") => {
                let username = req.json()["username"].as_str().unwrap_or_default().to_string();
                *requested.lock().unwrap() = username;
                MockResponse::json(200, json!({"message": "Request submitted"}))
            }
            ("GET", "/api/admin/password-resets") => MockResponse::json(
                200,
                json!([
                    {"id": "other", "student_username": "someone_else"},
                    {"id": "req-9", "student_username": requested.lock().unwrap().clone()},
                ]),
            ),
            ("PUT", "/api/admin/password-resets/req-9/approve") => {
                MockResponse::json(200, json!({"otp_code": "123456"}))
            }
            ("POST", "/api/auth/reset-password") => {
                MockResponse::json(200, json!({"message": "Password reset"}))
            }
            _ => fake::respond(req),
        })
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let backend = reset_portal();
        let mut ctx = context(backend.url());

        assert!(password_reset(&mut ctx).await.unwrap());

        let requests = backend.requests();
        let reset = requests
            .iter()
            .find(|r| r.url == "/api/auth/reset-password")
            .unwrap();
        assert_eq!(reset.json()["reset_code"], "123456");
        assert_eq!(reset.json()["new_password"], "NewPass@123");

        let records = ctx.session.tally_mut().drain();
        let old_login = records
            .iter()
            .find(|r| r.name == "Login with Old Password Rejected")
            .unwrap();
        assert_eq!(old_login.status, CheckStatus::Pass);
        assert_eq!(old_login.observed_status, Some(401));
        assert_eq!(requests.last().unwrap().method, "DELETE");
    }

    #[tokio::test]
    async fn test_password_reset_missing_request_short_circuits() {
        let backend = MockBackend::start(|req| match req.url.as_str() {
            "/api/admin/password-resets" => MockResponse::json(200, json!([])),
            "/api/auth/forgot-password" => MockResponse::json(200, json!({})),
            _ => fake::respond(req),
        });
        let mut ctx = context(backend.url());

        assert!(!password_reset(&mut ctx).await.unwrap());
        assert!(!backend.requests().iter().any(|r| r.method == "PUT"));
    }
}
