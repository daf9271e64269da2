//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// End-to-end test runner for the TWOEM student portal
#[derive(Parser, Debug)]
#[command(name = "twoem-e2e")]
#[command(version)]
#[command(about = "Drive a deployed TWOEM portal through its API and admin UI")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run API journeys against the backend
    Run(RunArgs),

    /// Run admin UI journeys through a WebDriver endpoint
    Browser(BrowserArgs),

    /// Check that the portal's static images are served
    Assets(AssetsArgs),

    /// List available scenarios
    List(ListArgs),

    /// View saved run results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Backend base URL
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Scenario to run, by slug or number (repeatable; default all)
    #[arg(short, long)]
    pub scenario: Vec<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save the run to the results directory
    #[arg(long)]
    pub save: bool,

    /// Write formatted results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for browser command
#[derive(Parser, Debug)]
pub struct BrowserArgs {
    /// Frontend base URL
    #[arg(long)]
    pub frontend_url: Option<String>,

    /// WebDriver endpoint
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Directory for PNG screenshots
    #[arg(long)]
    pub screenshots: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Journey to run, by slug or number (repeatable; default all)
    #[arg(short, long)]
    pub scenario: Vec<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save the run to the results directory
    #[arg(long)]
    pub save: bool,
}

/// Arguments for assets command
#[derive(Parser, Debug)]
pub struct AssetsArgs {
    /// Base URL serving the images
    #[arg(short, long)]
    pub base_url: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show category and admin requirement
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Show the most recent run in full
    #[arg(short, long)]
    pub latest: bool,

    /// Show a specific run in full
    #[arg(long)]
    pub id: Option<String>,

    /// Output format for the full view
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Export the selected run to file (.json or .csv)
    #[arg(short, long)]
    pub export: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./twoem-e2e.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (default: first one found)
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}
