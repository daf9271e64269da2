//! HTTP assertion harness
//!
//! A [`TestSession`] runs named checks against the portal API, compares the
//! observed status code with the expected one and keeps the run/pass tally.
//! Checks never fail outward: transport faults become failed records.

mod session;
mod tally;

pub use session::{Auth, Check, ResponseBody, TestSession};
pub use tally::Tally;
