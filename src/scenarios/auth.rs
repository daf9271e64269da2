//! Health probe and admin authentication journeys

use anyhow::Result;
use serde_json::json;
use tracing::info;

use super::{login, ScenarioContext};
use crate::harness::Check;

/// `GET health` must answer 200
pub async fn health(ctx: &mut ScenarioContext) -> Result<bool> {
    let outcome = ctx.session.check(Check::get("Health Check", "health", 200)).await;
    Ok(outcome.passed)
}

/// Admin credential exchange; stores the admin token
pub async fn admin_login(ctx: &mut ScenarioContext) -> Result<bool> {
    let (username, password) = (ctx.admin.username.clone(), ctx.admin.password.clone());
    match login(&mut ctx.session, "Admin Login", &username, &password).await {
        Some(token) => {
            ctx.session.set_admin_token(token);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Forced first-login password change.
///
/// When `auth/me` reports `is_first_login: true` the password is rotated to
/// the configured new one, the admin logs in again, and the flag must have
/// cleared. Otherwise the rotation is recorded as skipped.
pub async fn first_login(ctx: &mut ScenarioContext) -> Result<bool> {
    let me = ctx
        .session
        .check(Check::get("Get Admin Profile", "auth/me", 200).as_admin())
        .await;
    if !me.passed {
        return Ok(false);
    }

    let first_login = me.body.bool_field("is_first_login");
    if !ctx.session.verify(
        "Profile reports is_first_login",
        first_login.is_some(),
        "is_first_login missing from profile",
    ) {
        return Ok(false);
    }

    if first_login == Some(false) {
        ctx.session.skip(
            "Change Admin Password",
            "admin password was already changed",
        );
        return Ok(true);
    }

    let new_password = ctx.admin.new_password.clone();
    let change = ctx
        .session
        .check(
            Check::post("Change Admin Password", "auth/change-password", 200)
                .json(json!({"new_password": new_password}))
                .as_admin(),
        )
        .await;
    if !change.passed {
        return Ok(false);
    }
    ctx.admin.password = new_password.clone();
    info!("Admin password rotated");

    let username = ctx.admin.username.clone();
    let Some(token) = login(
        &mut ctx.session,
        "Admin Login With New Password",
        &username,
        &new_password,
    )
    .await
    else {
        return Ok(false);
    };
    ctx.session.set_admin_token(token);

    let me = ctx
        .session
        .check(Check::get("Get Admin Profile After Change", "auth/me", 200).as_admin())
        .await;
    if !me.passed {
        return Ok(false);
    }
    Ok(ctx.session.verify(
        "First login flag cleared",
        me.body.bool_field("is_first_login") == Some(false),
        "is_first_login is still set after the password change",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::CheckStatus;
    use crate::testing::{MockBackend, MockResponse};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn context(url: String) -> ScenarioContext {
        let config = AppConfig {
            backend_url: url,
            ..AppConfig::default()
        };
        ScenarioContext::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let backend = super::super::fake::portal();
        let mut ctx = context(backend.url());
        assert!(health(&mut ctx).await.unwrap());
        assert_eq!(backend.requests()[0].url, "/api/health");
    }

    #[tokio::test]
    async fn test_admin_login_stores_token() {
        let backend = super::super::fake::portal();
        let mut ctx = context(backend.url());

        assert!(admin_login(&mut ctx).await.unwrap());
        assert_eq!(ctx.session.admin_token(), Some("tok"));

        let body = backend.requests()[0].json();
        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "Twoemweb@2020");
    }

    #[tokio::test]
    async fn test_admin_login_without_token_fails() {
        let backend = MockBackend::start(|_| MockResponse::json(200, json!({"detail": "ok"})));
        let mut ctx = context(backend.url());

        assert!(!admin_login(&mut ctx).await.unwrap());
        assert!(ctx.session.admin_token().is_none());
        assert!(!ctx.session.tally().all_passed());
    }

    #[tokio::test]
    async fn test_first_login_rotates_password() {
        let changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&changed);
        let backend = MockBackend::start(move |req| match (req.method.as_str(), req.url.as_str()) {
            ("GET", "/api/auth/me") => MockResponse::json(
                200,
                json!({"username": "admin", "is_first_login": !flag.load(Ordering::SeqCst)}),
            ),
            ("POST", "/api/auth/change-password") => {
                flag.store(true, Ordering::SeqCst);
                MockResponse::json(200, json!({"message": "Password changed"}))
            }
            ("POST", "/api/auth/login") => {
                MockResponse::json(200, json!({"access_token": "rotated"}))
            }
            _ => MockResponse::json(404, json!({})),
        });
        let mut ctx = context(backend.url());
        ctx.session.set_admin_token("first");

        assert!(first_login(&mut ctx).await.unwrap());
        assert!(changed.load(Ordering::SeqCst));
        assert_eq!(ctx.admin.password, "NewAdminPass123!");
        assert_eq!(ctx.session.admin_token(), Some("rotated"));
        assert!(ctx.session.tally().all_passed());

        let requests = backend.requests();
        assert_eq!(requests[1].json(), json!({"new_password": "NewAdminPass123!"}));
        assert_eq!(requests[2].json()["password"], "NewAdminPass123!");
        assert_eq!(
            requests[3].header("Authorization").as_deref(),
            Some("Bearer rotated")
        );
    }

    #[tokio::test]
    async fn test_first_login_already_done_is_skipped() {
        let backend = MockBackend::start(|_| {
            MockResponse::json(200, json!({"username": "admin", "is_first_login": false}))
        });
        let mut ctx = context(backend.url());
        ctx.session.set_admin_token("tok");

        assert!(first_login(&mut ctx).await.unwrap());
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(ctx.admin.password, "Twoemweb@2020");

        let records = ctx.session.tally_mut().drain();
        assert_eq!(records.last().unwrap().status, CheckStatus::Skip);
    }
}
