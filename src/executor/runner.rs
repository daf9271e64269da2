//! Scenario execution runner
//!
//! Runs portal API journeys in catalogue order against one session.

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::models::{RunSummary, Scenario, ScenarioResult};
use crate::scenarios::{run_scenario, ScenarioContext};
use crate::utils::Timer;

/// Sequential runner for API journeys
pub struct ScenarioRunner {
    ctx: ScenarioContext,
    target: String,
}

impl ScenarioRunner {
    /// Create a new runner against the configured backend
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            ctx: ScenarioContext::new(config)?,
            target: config.backend_url.clone(),
        })
    }

    /// Order a selection for execution.
    ///
    /// An empty selection means every API journey. Browser journeys are
    /// dropped, AdminLogin is added when anything needs the admin token, and
    /// the result follows catalogue order without duplicates.
    pub fn plan(selected: &[Scenario]) -> Vec<Scenario> {
        if selected.is_empty() {
            return Scenario::api();
        }
        let needs_admin = selected.iter().any(Scenario::requires_admin);
        Scenario::api()
            .into_iter()
            .filter(|s| selected.contains(s) || (needs_admin && *s == Scenario::AdminLogin))
            .collect()
    }

    /// Run a single journey and collect its records
    pub async fn run_scenario(&mut self, scenario: Scenario) -> ScenarioResult {
        info!("Running {}", scenario);
        let timer = Timer::start(scenario.name());

        let outcome = run_scenario(scenario, &mut self.ctx).await;
        let duration_ms = timer.stop();
        let checks = self.ctx.session.tally_mut().drain();

        match outcome {
            Ok(completed) => ScenarioResult::from_checks(scenario, completed, duration_ms, checks),
            Err(e) => {
                error!("{} failed with error: {}", scenario, e);
                ScenarioResult::error(scenario, duration_ms, checks, e.to_string())
            }
        }
    }

    /// Run the planned journeys. A failed admin login stops the run.
    pub async fn run(&mut self, selected: &[Scenario]) -> RunSummary {
        let planned = Self::plan(selected);
        info!("Running {} scenarios against {}", planned.len(), self.target);

        let started_at = Utc::now();
        let mut results = Vec::new();
        let mut aborted = false;

        for scenario in planned {
            let result = self.run_scenario(scenario).await;
            info!("  {}", result);
            let fatal = scenario == Scenario::AdminLogin && !result.status.is_success();
            results.push(result);

            if fatal {
                println!("✗ Admin login failed, stopping tests");
                error!("Admin login failed, stopping tests");
                aborted = true;
                break;
            }
        }

        let tally = self.ctx.session.tally();
        println!(
            "\n📊 Tests passed: {}/{}",
            tally.tests_passed(),
            tally.tests_run()
        );
        if !tally.all_passed() {
            warn!(
                "{} of {} checks failed",
                tally.tests_run() - tally.tests_passed(),
                tally.tests_run()
            );
        }

        let summary = RunSummary::new(&self.target, started_at, results);
        let summary = if aborted { summary.aborted() } else { summary };

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.total_duration_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        summary
    }
}
