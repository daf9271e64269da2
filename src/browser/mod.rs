//! Browser journeys against the portal frontend
//!
//! Driven through any W3C WebDriver endpoint (chromedriver, geckodriver,
//! selenium) with `fantoccini`.

mod driver;
mod journeys;

use driver::BrowserSession;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::models::{CheckRecord, RunSummary, Scenario, ScenarioResult};
use crate::utils::Timer;

/// Run the selected browser journeys (all of them when none are selected)
pub async fn run_journeys(config: &AppConfig, selected: &[Scenario]) -> Result<RunSummary> {
    let planned: Vec<Scenario> = Scenario::browser()
        .into_iter()
        .filter(|s| selected.is_empty() || selected.contains(s))
        .collect();
    if planned.is_empty() {
        bail!("No browser journeys selected");
    }

    let mut ui = BrowserSession::connect(config).await?;
    let mut admin = config.admin.clone();
    let started_at = Utc::now();
    let mut results = Vec::new();

    for scenario in planned {
        info!("Running {}", scenario);
        println!("\n===== {} =====", scenario.name());
        let timer = Timer::start(scenario.name());

        let outcome = match scenario {
            Scenario::UiForcedPasswordChange => {
                journeys::forced_password_change(&mut ui, &mut admin).await
            }
            Scenario::UiLoginForm => journeys::login_form(&mut ui).await,
            Scenario::UiSessionLifecycle => journeys::session_lifecycle(&mut ui, &admin).await,
            api => Err(anyhow::anyhow!("{api} is not a browser journey")),
        };

        let duration_ms = timer.stop();
        let checks = ui.tally_mut().drain();
        if let Err(e) = &outcome {
            error!("{} failed with error: {}", scenario, e);
            if let Err(shot) = ui.screenshot(&format!("{}_error", scenario.slug())).await {
                error!("Screenshot failed: {}", shot);
            }
        }
        let result = journey_result(scenario, outcome, duration_ms, checks);
        info!("  {}", result);
        results.push(result);
    }

    println!(
        "\n📊 Tests passed: {}/{}",
        ui.tally().tests_passed(),
        ui.tally().tests_run()
    );
    if let Err(e) = ui.close().await {
        error!("Failed to close browser session: {}", e);
    }

    Ok(RunSummary::new(&config.frontend_url, started_at, results))
}

/// Fold one journey's outcome and drained checks into its result
fn journey_result(
    scenario: Scenario,
    outcome: Result<bool>,
    duration_ms: u64,
    checks: Vec<CheckRecord>,
) -> ScenarioResult {
    match outcome {
        Ok(completed) => ScenarioResult::from_checks(scenario, completed, duration_ms, checks),
        Err(e) => ScenarioResult::error(scenario, duration_ms, checks, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckStatus;

    fn record(status: CheckStatus) -> CheckRecord {
        CheckRecord::new("Login Page Loads", "http://localhost:3000/admin/login", status)
    }

    #[test]
    fn test_completed_journey_passes() {
        let result = journey_result(
            Scenario::UiLoginForm,
            Ok(true),
            40,
            vec![record(CheckStatus::Pass), record(CheckStatus::Pass)],
        );
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.passed(), 2);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_short_circuited_journey_fails() {
        let result = journey_result(
            Scenario::UiSessionLifecycle,
            Ok(false),
            40,
            vec![record(CheckStatus::Pass), record(CheckStatus::Fail)],
        );
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.failed(), 1);
    }

    #[test]
    fn test_driver_fault_before_any_check_fails_the_run() {
        let result = journey_result(
            Scenario::UiForcedPasswordChange,
            Err(anyhow::anyhow!("element not found: #username")),
            15,
            Vec::new(),
        );
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message.as_deref(), Some("element not found: #username"));
        assert_eq!(result.failed(), 1);

        let summary = RunSummary::new("http://localhost:3000", Utc::now(), vec![result]);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_fault_keeps_checks_recorded_before_it() {
        let result = journey_result(
            Scenario::UiLoginForm,
            Err(anyhow::anyhow!("session closed")),
            15,
            vec![record(CheckStatus::Pass)],
        );
        assert_eq!(result.checks.len(), 2);
        assert_eq!(result.checks[0].status, CheckStatus::Pass);
        assert_eq!(result.checks[1].status, CheckStatus::Error);
    }
}
