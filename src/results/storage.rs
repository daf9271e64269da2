//! Results storage and retrieval
//!
//! Persists run summaries as JSON files, one per run.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::RunSummary;

/// A saved run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    /// Which surface was exercised ("api" or "browser")
    pub kind: String,

    /// Results of the run
    pub summary: RunSummary,

    /// Environment information
    pub environment: EnvironmentInfo,
}

/// Environment information
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system
    pub os: String,

    /// Architecture
    pub arch: String,

    /// Tool version
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl StoredRun {
    pub fn new(kind: &str, summary: RunSummary) -> Self {
        Self {
            id: generate_run_id(),
            kind: kind.to_string(),
            summary,
            environment: EnvironmentInfo::default(),
        }
    }

    fn info(&self) -> RunInfo {
        RunInfo {
            id: self.id.clone(),
            kind: self.kind.clone(),
            target: self.summary.target.clone(),
            started_at: self.summary.started_at,
            passed: self.summary.passed,
            total: self.summary.total,
            aborted: self.summary.aborted,
        }
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    base_dir: PathBuf,
}

impl ResultsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Use `dir` when given, otherwise the platform data directory
    pub fn open(dir: Option<&str>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::new(
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("twoem-e2e")
                    .join("results"),
            ),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create results directory: {}",
                self.base_dir.display()
            )
        })?;

        let path = self.run_path(&run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved test results to {}", path.display());
        Ok(path)
    }

    /// Load a run by ID
    pub fn load(&self, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(run_id);
        if !path.exists() {
            bail!("No saved run with id {run_id}");
        }
        self.load_from_path(&path)
    }

    fn load_from_path(&self, path: &Path) -> Result<StoredRun> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open results file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))
    }

    /// Load every saved run, newest first. Unreadable files are skipped.
    pub fn load_all(&self) -> Result<Vec<StoredRun>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => debug!("Skipping {}: {}", path.display(), e),
                }
            }
        }

        runs.sort_by(|a, b| b.summary.started_at.cmp(&a.summary.started_at));
        Ok(runs)
    }

    /// Brief information about every saved run, newest first
    pub fn list(&self) -> Result<Vec<RunInfo>> {
        Ok(self.load_all()?.iter().map(StoredRun::info).collect())
    }

    /// Most recent run
    pub fn latest(&self) -> Result<Option<StoredRun>> {
        Ok(self.load_all()?.into_iter().next())
    }

    /// Export a run to a file
    pub fn export(&self, run: &StoredRun, path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), run)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;
                writer.write_record([
                    "run_id",
                    "scenario",
                    "check",
                    "target",
                    "status",
                    "expected_status",
                    "observed_status",
                    "duration_ms",
                    "message",
                ])?;

                for result in &run.summary.scenarios {
                    for check in &result.checks {
                        writer.write_record([
                            run.id.clone(),
                            result.scenario.name().to_string(),
                            check.name.clone(),
                            check.target.clone(),
                            check.status.to_string(),
                            check
                                .expected_status
                                .map(|s| s.to_string())
                                .unwrap_or_default(),
                            check
                                .observed_status
                                .map(|s| s.to_string())
                                .unwrap_or_default(),
                            check.duration_ms.to_string(),
                            check.message.clone().unwrap_or_default(),
                        ])?;
                    }
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Brief run information
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub passed: usize,
    pub total: usize,
    pub aborted: bool,
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckRecord, CheckStatus, Scenario, ScenarioResult};
    use chrono::Duration;

    fn summary(started_at: DateTime<Utc>) -> RunSummary {
        let health = ScenarioResult::from_checks(
            Scenario::Health,
            true,
            5,
            vec![
                CheckRecord::new("Health Check", "GET /api/health", CheckStatus::Pass)
                    .with_statuses(200, Some(200)),
            ],
        );
        RunSummary::new("http://localhost:8001", started_at, vec![health])
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id();
        assert_eq!(id.len(), "20240101_120000_0000".len());
        assert_eq!(id.matches('_').count(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let run = StoredRun::new("api", summary(Utc::now()));

        let path = storage.save(&run).unwrap();
        assert!(path.exists());

        let loaded = storage.load(&run.id).unwrap();
        assert_eq!(loaded.kind, "api");
        assert_eq!(loaded.summary.passed, 1);
        assert_eq!(loaded.environment.tool_version, env!("CARGO_PKG_VERSION"));
        assert!(storage.load("missing").is_err());
    }

    #[test]
    fn test_latest_is_newest_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        assert!(storage.latest().unwrap().is_none());

        let mut older = StoredRun::new("api", summary(Utc::now() - Duration::hours(1)));
        older.id = "older".to_string();
        let mut newer = StoredRun::new("browser", summary(Utc::now()));
        newer.id = "newer".to_string();
        storage.save(&older).unwrap();
        storage.save(&newer).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        assert_eq!(storage.latest().unwrap().unwrap().id, "newer");
        let listed = storage.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id, "older");
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResultsStorage::new(dir.path());
        let run = StoredRun::new("api", summary(Utc::now()));
        let path = dir.path().join("export.csv");

        storage.export(&run, &path, ExportFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Health Check");
        assert_eq!(&rows[0][4], "PASS");
        assert_eq!(&rows[0][6], "200");
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("JSON"), Some(ExportFormat::Json));
        assert_eq!(
            ExportFormat::from_extension(Path::new("out.csv")),
            Some(ExportFormat::Csv)
        );
        assert!(ExportFormat::from_str("xml").is_none());
    }
}
