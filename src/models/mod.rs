//! Data models for portal end-to-end testing
//!
//! This module contains all data structures used throughout the application.

mod check;
mod scenario;

pub use check::{CheckRecord, CheckStatus, RunSummary, ScenarioResult};
pub use scenario::Scenario;
