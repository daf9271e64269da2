//! Scenario execution engine
//!
//! Strictly sequential: each journey finishes before the next one starts.

mod runner;

pub use runner::ScenarioRunner;
