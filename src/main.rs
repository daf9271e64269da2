//! TWOEM portal end-to-end tester
//!
//! A CLI tool that drives an already-deployed TWOEM student portal through
//! its REST API and its admin UI, and reports every check it makes.
//!
//! ## Features
//!
//! - API journeys covering auth, students, password resets, downloads,
//!   notifications, resources and WiFi credentials
//! - Browser journeys for the admin login page through any WebDriver endpoint
//! - Multiple output formats (Table, JSON, CSV)
//! - Saved runs with JSON/CSV export
//!
//! ## Usage
//!
//! ```bash
//! # Run every API journey against a local backend
//! twoem-e2e run --base-url http://localhost:8001
//!
//! # Run selected journeys (admin login is added automatically)
//! twoem-e2e run --scenario downloads --scenario wifi
//!
//! # Drive the admin UI through chromedriver
//! twoem-e2e browser --webdriver-url http://localhost:9515 --screenshots ./shots
//!
//! # List scenarios
//! twoem-e2e list --detailed
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};

mod browser;
mod cli;
mod config;
mod executor;
mod harness;
mod http;
mod models;
mod output;
mod results;
mod scenarios;
#[cfg(test)]
mod testing;
mod utils;

use cli::Args;
use config::{AppConfig, ConfigFile, EnvConfig};
use executor::ScenarioRunner;
use models::{RunSummary, Scenario};
use output::{OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultsStorage, StoredRun};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let verbose = args.verbose || EnvConfig::load().verbose.unwrap_or(false);
    let level = match args.log_level.as_deref() {
        Some(name) => LogLevel::from_str(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown log level: {name}"))?,
        None => LogLevel::from_verbose(verbose),
    };
    init_logger(level);

    let config_file = args.config.as_deref();
    match args.command {
        cli::Command::Run(run_args) => run_api(run_args, config_file).await,
        cli::Command::Browser(browser_args) => run_browser(browser_args, config_file).await,
        cli::Command::Assets(assets_args) => run_assets(assets_args, config_file).await,
        cli::Command::List(list_args) => {
            list_scenarios(list_args);
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Results(results_args) => {
            show_results(results_args, config_file)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, config_file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Check the effective configuration after CLI overrides
fn validated(config: AppConfig) -> Result<AppConfig> {
    let file = ConfigFile {
        app: config,
        ..ConfigFile::default()
    };
    file.validate()?;
    Ok(file.app)
}

/// Parse `--scenario` values by slug or number
fn parse_scenarios(values: &[String]) -> Result<Vec<Scenario>> {
    values
        .iter()
        .map(|value| {
            Scenario::from_slug(value).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown scenario: {value}. Run `twoem-e2e list` to see the options."
                )
            })
        })
        .collect()
}

fn output_format(requested: Option<&str>, config: &AppConfig) -> Result<OutputFormat> {
    let name = requested.unwrap_or(&config.output_format);
    OutputFormat::from_str(name).ok_or_else(|| anyhow::anyhow!("Unknown output format: {name}"))
}

fn save_run(config: &AppConfig, kind: &str, summary: &RunSummary) -> Result<()> {
    let storage = ResultsStorage::open(config.results_dir.as_deref());
    let run = StoredRun::new(kind, summary.clone());
    let path = storage.save(&run)?;
    println!("✓ Run {} saved to {}", run.id, path.display());
    Ok(())
}

async fn run_api(args: cli::RunArgs, config_file: Option<&str>) -> Result<ExitCode> {
    let mut config = AppConfig::resolve(config_file)?;
    if let Some(url) = args.base_url {
        config.backend_url = url;
    }
    let config = validated(config)?;
    let format = output_format(args.format.as_deref(), &config)?;

    let selected = parse_scenarios(&args.scenario)?;
    if let Some(ui) = selected.iter().find(|s| s.is_browser()) {
        bail!("{ui} drives the admin UI. Use `twoem-e2e browser` for it.");
    }

    info!("Testing portal backend at {}", config.backend_url);
    let mut runner = ScenarioRunner::new(&config)?;
    let summary = runner.run(&selected).await;

    println!("{}", ResultFormatter::new(format).format_summary(&summary));

    if let Some(path) = &args.output {
        output::write_results_to_file(path, &summary, format)?;
        println!("✓ Results written to {path}");
    }
    if args.save {
        save_run(&config, "api", &summary)?;
    }

    Ok(ExitCode::from(summary.exit_code()))
}

async fn run_browser(args: cli::BrowserArgs, config_file: Option<&str>) -> Result<ExitCode> {
    let mut config = AppConfig::resolve(config_file)?;
    if let Some(url) = args.frontend_url {
        config.frontend_url = url;
    }
    if let Some(url) = args.webdriver_url {
        config.webdriver_url = url;
    }
    if let Some(dir) = args.screenshots {
        config.browser.screenshot_dir = Some(dir);
    }
    if args.headed {
        config.browser.headless = false;
    }
    let config = validated(config)?;
    let format = output_format(args.format.as_deref(), &config)?;

    let selected = parse_scenarios(&args.scenario)?;
    if let Some(api) = selected.iter().find(|s| !s.is_browser()) {
        bail!("{api} is an API journey. Use `twoem-e2e run` for it.");
    }

    info!(
        "Testing portal frontend at {} through {}",
        config.frontend_url, config.webdriver_url
    );
    let summary = browser::run_journeys(&config, &selected).await?;

    println!("{}", ResultFormatter::new(format).format_summary(&summary));
    if args.save {
        save_run(&config, "browser", &summary)?;
    }

    Ok(ExitCode::from(summary.exit_code()))
}

async fn run_assets(args: cli::AssetsArgs, config_file: Option<&str>) -> Result<ExitCode> {
    let mut config = AppConfig::resolve(config_file)?;
    if let Some(url) = args.base_url {
        config.backend_url = url;
    }
    let config = validated(config)?;

    let mut runner = ScenarioRunner::new(&config)?;
    let summary = runner.run(&[Scenario::ImageAssets]).await;
    println!(
        "{}",
        ResultFormatter::new(OutputFormat::Summary).format_summary(&summary)
    );

    Ok(ExitCode::from(summary.exit_code()))
}

fn list_scenarios(args: cli::ListArgs) {
    println!("\nTWOEM Portal Scenarios ({} total)\n", Scenario::all().len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut current_category = "";

    for scenario in Scenario::all() {
        let category = scenario.category();
        if category != current_category {
            println!("\n{category} Scenarios:");
            println!("──────────────────────────────────────────────────────────────────────");
            current_category = category;
        }

        if args.detailed {
            let admin = if scenario.requires_admin() {
                "admin"
            } else {
                ""
            };
            println!(
                "  {:2}. {:30} {:26} {}",
                scenario.number(),
                scenario.name(),
                scenario.slug(),
                admin
            );
        } else {
            println!("  {:2}. {}", scenario.number(), scenario.name());
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    if args.detailed {
        println!("Journeys marked admin run after Admin Login, which is added automatically.\n");
    }
}

fn show_results(args: cli::ResultsArgs, config_file: Option<&str>) -> Result<()> {
    let config = AppConfig::resolve(config_file)?;
    let storage = ResultsStorage::open(config.results_dir.as_deref());

    let selected = match (&args.id, args.latest) {
        (Some(id), _) => Some(storage.load(id)?),
        (None, true) => storage.latest()?,
        (None, false) if args.export.is_some() => storage.latest()?,
        (None, false) => {
            list_runs(&storage)?;
            return Ok(());
        }
    };

    let Some(run) = selected else {
        println!("\n📭 No stored results found in {}", storage.base_dir().display());
        println!("   Run tests with: twoem-e2e run --save");
        return Ok(());
    };

    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    println!("Run {} ({})", run.id, run.kind);
    println!("{}", ResultFormatter::new(format).format_summary(&run.summary));

    if let Some(export_path) = &args.export {
        let path = PathBuf::from(export_path);
        let format = ExportFormat::from_extension(&path).unwrap_or_else(|| {
            warn!("Unknown export extension, writing JSON");
            ExportFormat::Json
        });
        storage.export(&run, &path, format)?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}

fn list_runs(storage: &ResultsStorage) -> Result<()> {
    let runs = storage.list()?;
    if runs.is_empty() {
        println!("\n📭 No stored results found in {}", storage.base_dir().display());
        println!("   Run tests with: twoem-e2e run --save");
        return Ok(());
    }

    println!("\n┌──────────────────────────────────────────────────────────────────────┐");
    println!("│ Stored Test Runs                                                     │");
    println!("├──────────────────────────────────────────────────────────────────────┤");
    for run in &runs {
        println!(
            "│ {:20} │ {:7} │ {} │ {:>3}/{:<3} {:8}│",
            run.id,
            run.kind,
            run.started_at.format("%Y-%m-%d %H:%M"),
            run.passed,
            run.total,
            if run.aborted { "aborted" } else { "" }
        );
        println!("│   {:67}│", run.target);
    }
    println!("└──────────────────────────────────────────────────────────────────────┘");
    println!("\nUse --latest or --id <run> to view a run in full.\n");

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, config_file: Option<&str>) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                bail!("Configuration file already exists: {output}. Use --force to overwrite.");
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let effective = ConfigFile {
                    app: AppConfig::resolve(config_file)?,
                    ..ConfigFile::default()
                };
                let output = if format == "json" {
                    serde_json::to_string_pretty(&effective)?
                } else {
                    serde_yaml::to_string(&effective)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let Some(path) = file
                .or_else(|| config_file.map(str::to_string))
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
            else {
                bail!("No configuration file found. Create one with `twoem-e2e config init`.");
            };

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            config::print_env_help();
        }
    }

    Ok(())
}
