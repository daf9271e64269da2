//! Admin UI journeys

use anyhow::Result;
use tracing::info;

use super::driver::{BrowserSession, Target};
use crate::config::AdminCredentials;

fn username() -> Target {
    Target::css("#username")
}

fn password() -> Target {
    Target::css("#password")
}

fn submit() -> Target {
    Target::css("button[type=\"submit\"]")
}

fn error_banner() -> Target {
    Target::css(".bg-red-500")
}

/// Whether `url` is the site root of `frontend`
pub fn is_site_root(frontend: &str, url: &str) -> bool {
    url.trim_end_matches('/') == frontend.trim_end_matches('/')
}

/// Fill the login form and submit it
async fn submit_login(ui: &BrowserSession, user: &str, pass: &str) -> Result<()> {
    ui.open("/login").await?;
    ui.fill(&username(), user).await?;
    ui.fill(&password(), pass).await?;
    ui.click(&submit()).await
}

/// First admin login redirects to the change-password page, which leads to
/// the dashboard once a new password is set.
pub async fn forced_password_change(
    ui: &mut BrowserSession,
    admin: &mut AdminCredentials,
) -> Result<bool> {
    submit_login(ui, &admin.username, &admin.password).await?;

    let landed = ui
        .wait_for_url("change-password page or dashboard", |url| {
            url.contains("/change-password") || url.contains("/admin")
        })
        .await;
    ui.screenshot("after_login").await?;

    let url = match landed {
        Ok(url) => url,
        Err(_) => {
            let reason = ui
                .text(&error_banner())
                .await
                .unwrap_or_else(|| "no redirect after login".to_string());
            ui.verify("Admin login redirects", false, reason);
            return Ok(false);
        }
    };

    if !url.contains("/change-password") {
        ui.skip(
            "Change password on first login",
            "admin is already past first login",
        );
        return Ok(true);
    }
    ui.verify("Redirected to change password on first login", true, "");

    ui.fill(&Target::css("#newPassword"), &admin.new_password)
        .await?;
    ui.fill(&Target::css("#confirmPassword"), &admin.new_password)
        .await?;
    ui.click(&submit()).await?;

    let reached = ui
        .wait_for_url("admin dashboard", |url| url.contains("/admin"))
        .await
        .is_ok();
    ui.screenshot("admin_dashboard").await?;
    if reached {
        admin.password = admin.new_password.clone();
        info!("Admin password changed through the UI");
    }
    Ok(ui.verify(
        "Dashboard after password change",
        reached,
        "no redirect to /admin after changing password",
    ))
}

/// Validation, show/hide toggle, bad credentials and the forgot-password
/// panel on the login page
pub async fn login_form(ui: &mut BrowserSession) -> Result<bool> {
    ui.open("/login").await?;
    ui.wait_for(&username()).await?;
    ui.screenshot("login_page").await?;

    ui.click(&submit()).await?;
    let validity = ui
        .eval(
            "return [document.querySelector('#username').validity.valid, \
             document.querySelector('#password').validity.valid];",
        )
        .await?;
    ui.verify(
        "Empty form is rejected by validation",
        validity == serde_json::json!([false, false]),
        format!("validity was {validity}"),
    );

    ui.fill(&password(), "TestPassword123").await?;
    let toggle = Target::css("button.absolute.inset-y-0.right-0");
    let initial = ui.attr(&password(), "type").await;
    ui.click(&toggle).await?;
    let shown = ui.attr(&password(), "type").await;
    ui.click(&toggle).await?;
    let hidden = ui.attr(&password(), "type").await;
    ui.verify(
        "Password visibility toggle",
        initial.as_deref() == Some("password")
            && shown.as_deref() == Some("text")
            && hidden.as_deref() == Some("password"),
        format!("type went {initial:?} -> {shown:?} -> {hidden:?}"),
    );

    ui.fill(&username(), "admin").await?;
    ui.fill(&password(), "wrongpassword").await?;
    ui.click(&submit()).await?;
    let message = match ui.wait_for(&error_banner()).await {
        Ok(banner) => banner.text().await.unwrap_or_default(),
        Err(_) => String::new(),
    };
    ui.verify(
        "Invalid credentials show an error",
        !message.trim().is_empty(),
        "no error message after a wrong password",
    );
    ui.screenshot("invalid_credentials_error").await?;

    ui.click(&Target::button("Forgot Password?")).await?;
    let reset_form = ui.wait_for(&Target::css("#reset-username")).await.is_ok();
    ui.verify(
        "Forgot password form opens",
        reset_form,
        "#reset-username did not appear",
    );
    if reset_form {
        ui.screenshot("forgot_password_form").await?;
        ui.click(&Target::button("Back to login")).await?;
        let back = ui.wait_for(&username()).await.is_ok();
        ui.verify("Back to login restores the form", back, "#username not visible");
    }

    ui.click(&Target::button("Back to website")).await?;
    let frontend = ui.frontend_url().to_string();
    let home = ui
        .wait_for_url("site root", |url| is_site_root(&frontend, url))
        .await
        .is_ok();
    Ok(ui.verify(
        "Back to website returns to the home page",
        home,
        "did not reach the site root",
    ))
}

/// Login, token storage, navigation, logout and the protected-route redirect
pub async fn session_lifecycle(ui: &mut BrowserSession, admin: &AdminCredentials) -> Result<bool> {
    submit_login(ui, &admin.username, &admin.password).await?;
    let dashboard = ui
        .wait_for_url("admin dashboard", |url| url.contains("/admin"))
        .await
        .is_ok();
    if !ui.verify(
        "Login reaches the dashboard",
        dashboard,
        "no redirect to /admin after login",
    ) {
        return Ok(false);
    }

    let token = ui.eval("return localStorage.getItem('token');").await?;
    ui.verify(
        "Token stored in localStorage",
        token.as_str().is_some_and(|t| !t.is_empty()),
        "localStorage has no token",
    );

    ui.click(&Target::link("Students")).await?;
    let students = ui
        .wait_for_url("students page", |url| url.contains("/admin/students"))
        .await
        .is_ok();
    ui.verify(
        "Students link opens the students page",
        students,
        "did not reach /admin/students",
    );
    ui.screenshot("students_page").await?;

    ui.click(&Target::button("Logout")).await?;
    let frontend = ui.frontend_url().to_string();
    let logged_out = ui
        .wait_for_url("site root after logout", |url| is_site_root(&frontend, url))
        .await
        .is_ok();
    if !ui.verify("Logout returns to the home page", logged_out, "logout failed") {
        return Ok(false);
    }

    ui.open("/admin").await?;
    let redirected = ui
        .wait_for_url("login page", |url| url.contains("/login"))
        .await
        .is_ok();
    Ok(ui.verify(
        "Protected route redirects to login after logout",
        redirected,
        "/admin stayed reachable after logout",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_site_root() {
        assert!(is_site_root("http://localhost:3000", "http://localhost:3000/"));
        assert!(is_site_root("http://localhost:3000/", "http://localhost:3000"));
        assert!(!is_site_root("http://localhost:3000", "http://localhost:3000/login"));
    }

    #[test]
    fn test_selectors() {
        assert_eq!(submit(), Target::Css("button[type=\"submit\"]".to_string()));
        assert_eq!(error_banner().to_string(), "'.bg-red-500'");
    }
}
