//! Output formatters for run results
//!
//! Provides Table, JSON, CSV, and summary output formats.

use anyhow::Context;
use std::io::Write;

use crate::models::{CheckRecord, CheckStatus, RunSummary, ScenarioResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "scenario_num",
    "scenario",
    "check",
    "target",
    "status",
    "expected_status",
    "observed_status",
    "duration_ms",
    "message",
];

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_label(&self, status: CheckStatus) -> &'static str {
        if self.colorize {
            match status {
                CheckStatus::Pass => "\x1b[32m✓ PASS\x1b[0m",
                CheckStatus::Fail => "\x1b[31m✗ FAIL\x1b[0m",
                CheckStatus::Skip => "\x1b[33m○ SKIP\x1b[0m",
                CheckStatus::Error => "\x1b[31m! ERROR\x1b[0m",
            }
        } else {
            match status {
                CheckStatus::Pass => "✓ PASS",
                CheckStatus::Fail => "✗ FAIL",
                CheckStatus::Skip => "○ SKIP",
                CheckStatus::Error => "! ERROR",
            }
        }
    }

    fn format_scenario_table(&self, result: &ScenarioResult) -> String {
        let counted = result
            .checks
            .iter()
            .filter(|c| c.status.is_counted())
            .count();
        format!(
            "{:2}. {:28} {} {:>3}/{:<3} [{:>6}ms]",
            result.scenario.number(),
            result.scenario.name(),
            self.status_label(result.status),
            result.passed(),
            counted,
            result.duration_ms
        )
    }

    fn check_csv_record(result: &ScenarioResult, check: &CheckRecord) -> [String; 9] {
        let optional = |v: Option<u16>| v.map(|n| n.to_string()).unwrap_or_default();
        [
            result.scenario.number().to_string(),
            result.scenario.name().to_string(),
            check.name.clone(),
            check.target.clone(),
            check.status.to_string(),
            optional(check.expected_status),
            optional(check.observed_status),
            check.duration_ms.to_string(),
            check.message.clone().unwrap_or_default(),
        ]
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_summary_csv(summary).unwrap_or_default(),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  {:60}║\n", summary.target));
        output.push_str(&format!(
            "║  Started {:52}║\n",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for result in &summary.scenarios {
            output.push_str(&format!("║  {}\n", self.format_scenario_table(result)));
            for check in result.checks.iter().filter(|c| !c.status.is_success()) {
                let detail = check.message.as_deref().unwrap_or("");
                output.push_str(&format!(
                    "║      {} {} ({}) {}\n",
                    check.status.symbol(),
                    check.name,
                    check.target,
                    detail
                ));
            }
            if let Some(message) = &result.message {
                output.push_str(&format!("║      {message}\n"));
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            "║  Total: {:3} | Pass: {} | Fail: {} | Skip: {:2} | Error: {:2}\n",
            summary.total, pass_str, fail_str, summary.skipped, summary.errors
        ));
        output.push_str(&format!(
            "║  Pass Rate: {:5.1}% | Duration: {:6}ms\n",
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        if summary.aborted {
            output.push_str("║  Run stopped early: admin login failed\n");
        }
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_summary_csv(&self, summary: &RunSummary) -> anyhow::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for result in &summary.scenarios {
            for check in &result.checks {
                writer.write_record(Self::check_csv_record(result, check))?;
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%) in {}ms{}",
            summary.target,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.total_duration_ms,
            if summary.aborted { " [aborted]" } else { "" }
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write results to a file
pub fn write_results_to_file(
    path: &str,
    summary: &RunSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_summary(summary);

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {path}"))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write output file: {path}"))?;

    Ok(())
}
