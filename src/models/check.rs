//! Check and run result models
//!
//! Defines individual check records, per-scenario results and run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Scenario;

/// Check execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl CheckStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "✓",
            CheckStatus::Fail => "✗",
            CheckStatus::Skip => "○",
            CheckStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckStatus::Pass)
    }

    /// Skipped checks do not count towards the run tally
    pub fn is_counted(&self) -> bool {
        !matches!(self, CheckStatus::Skip)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
            CheckStatus::Skip => write!(f, "SKIP"),
            CheckStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of a single named check
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    /// `"POST /api/auth/login"`, `"GET /images/x.jpg"` or `"UI /login"`
    pub target: String,
    pub status: CheckStatus,
    pub expected_status: Option<u16>,
    pub observed_status: Option<u16>,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl CheckRecord {
    pub fn new(name: impl Into<String>, target: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            status,
            expected_status: None,
            observed_status: None,
            duration_ms: 0,
            message: None,
        }
    }

    pub fn with_statuses(mut self, expected: u16, observed: Option<u16>) -> Self {
        self.expected_status = Some(expected);
        self.observed_status = observed;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for CheckRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) [{}ms]",
            self.status.symbol(),
            self.name,
            self.target,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Result of one scenario journey
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub status: CheckStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    pub checks: Vec<CheckRecord>,
}

impl ScenarioResult {
    /// Build a result from the journey's records.
    ///
    /// The scenario passes only when the journey completed and none of its
    /// counted checks failed.
    pub fn from_checks(
        scenario: Scenario,
        completed: bool,
        duration_ms: u64,
        checks: Vec<CheckRecord>,
    ) -> Self {
        let all_passed = checks
            .iter()
            .filter(|c| c.status.is_counted())
            .all(|c| c.status.is_success());
        let any_counted = checks.iter().any(|c| c.status.is_counted());

        let status = if completed && all_passed && any_counted {
            CheckStatus::Pass
        } else if completed && !any_counted {
            CheckStatus::Skip
        } else {
            CheckStatus::Fail
        };

        Self {
            scenario,
            status,
            duration_ms,
            message: None,
            checks,
        }
    }

    /// The journey hit a local fault; the fault itself is recorded as an error check
    pub fn error(
        scenario: Scenario,
        duration_ms: u64,
        mut checks: Vec<CheckRecord>,
        error: impl Into<String>,
    ) -> Self {
        let message = error.into();
        checks.push(
            CheckRecord::new(scenario.name(), "journey", CheckStatus::Error)
                .with_message(message.clone()),
        );
        Self {
            scenario,
            status: CheckStatus::Error,
            duration_ms,
            message: Some(message),
            checks,
        }
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Fail) + self.count(CheckStatus::Error)
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms] {} passed, {} failed",
            self.status.symbol(),
            self.scenario,
            self.duration_ms,
            self.passed(),
            self.failed()
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub aborted: bool,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
    pub scenarios: Vec<ScenarioResult>,
}

impl RunSummary {
    pub fn new(
        target: impl Into<String>,
        started_at: DateTime<Utc>,
        scenarios: Vec<ScenarioResult>,
    ) -> Self {
        let checks = || scenarios.iter().flat_map(|s| s.checks.iter());
        let count = |status: CheckStatus| checks().filter(|c| c.status == status).count();

        let passed = count(CheckStatus::Pass);
        let failed = count(CheckStatus::Fail);
        let skipped = count(CheckStatus::Skip);
        let errors = count(CheckStatus::Error);
        let total_duration_ms = scenarios.iter().map(|s| s.duration_ms).sum();

        Self {
            target: target.into(),
            started_at,
            aborted: false,
            total: passed + failed + errors,
            passed,
            failed,
            skipped,
            errors,
            total_duration_ms,
            scenarios,
        }
    }

    pub fn aborted(mut self) -> Self {
        self.aborted = true;
        self
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Every counted check passed, no scenario failed and the run was not cut short
    pub fn is_all_passed(&self) -> bool {
        !self.aborted
            && self.passed == self.total
            && self
                .scenarios
                .iter()
                .all(|s| !matches!(s.status, CheckStatus::Fail | CheckStatus::Error))
    }

    /// Process exit code for this run
    pub fn exit_code(&self) -> u8 {
        if self.is_all_passed() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run against {}", self.target)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for scenario in &self.scenarios {
            writeln!(f, "  {scenario}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {}",
            self.total, self.passed, self.failed, self.skipped, self.errors
        )?;
        write!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )?;
        if self.aborted {
            write!(f, " | ABORTED")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: CheckStatus) -> CheckRecord {
        CheckRecord::new("check", "GET /api/health", status)
    }

    #[test]
    fn test_scenario_result_passes_only_when_all_counted_checks_pass() {
        let ok = ScenarioResult::from_checks(
            Scenario::Health,
            true,
            10,
            vec![record(CheckStatus::Pass), record(CheckStatus::Skip)],
        );
        assert_eq!(ok.status, CheckStatus::Pass);

        let failed = ScenarioResult::from_checks(
            Scenario::Health,
            true,
            10,
            vec![record(CheckStatus::Pass), record(CheckStatus::Error)],
        );
        assert_eq!(failed.status, CheckStatus::Fail);
        assert_eq!(failed.failed(), 1);
    }

    #[test]
    fn test_short_circuited_scenario_fails() {
        let result = ScenarioResult::from_checks(
            Scenario::PasswordReset,
            false,
            10,
            vec![record(CheckStatus::Pass)],
        );
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn test_run_summary_counts() {
        let scenarios = vec![
            ScenarioResult::from_checks(
                Scenario::Health,
                true,
                5,
                vec![record(CheckStatus::Pass)],
            ),
            ScenarioResult::from_checks(
                Scenario::FirstLogin,
                true,
                7,
                vec![
                    record(CheckStatus::Pass),
                    record(CheckStatus::Skip),
                    record(CheckStatus::Fail),
                ],
            ),
        ];

        let summary = RunSummary::new("http://localhost:8001", Utc::now(), scenarios);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_duration_ms, 12);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_aborted_run_is_not_successful() {
        let summary = RunSummary::new("http://localhost:8001", Utc::now(), Vec::new());
        assert!(summary.is_all_passed());
        let aborted = summary.aborted();
        assert!(!aborted.is_all_passed());
        assert_eq!(aborted.exit_code(), 1);
    }

    #[test]
    fn test_errored_scenario_without_checks_fails_the_run() {
        let errored = ScenarioResult::error(Scenario::UiLoginForm, 5, Vec::new(), "Timed out");
        assert_eq!(errored.checks.len(), 1);
        assert_eq!(errored.checks[0].status, CheckStatus::Error);
        assert_eq!(errored.checks[0].message.as_deref(), Some("Timed out"));

        let summary = RunSummary::new("http://localhost:3000", Utc::now(), vec![errored]);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total, 1);
        assert!(!summary.is_all_passed());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_failed_scenario_status_fails_the_run() {
        let short_circuited = ScenarioResult::from_checks(Scenario::Wifi, false, 5, Vec::new());
        let summary = RunSummary::new("http://localhost:8001", Utc::now(), vec![short_circuited]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 1);
    }
}
