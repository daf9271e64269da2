//! Run/pass counters shared by API and browser journeys

use crate::models::{CheckRecord, CheckStatus};

/// Counts checks and keeps their records until a scenario drains them
#[derive(Debug, Default)]
pub struct Tally {
    tests_run: usize,
    tests_passed: usize,
    records: Vec<CheckRecord>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record. Skipped records are kept but not counted.
    pub fn record(&mut self, record: CheckRecord) {
        if record.status.is_counted() {
            self.tests_run += 1;
            if record.status.is_success() {
                self.tests_passed += 1;
            }
        }
        self.records.push(record);
    }

    /// Record a non-HTTP assertion and print its outcome
    pub fn verify(
        &mut self,
        name: &str,
        target: &str,
        condition: bool,
        failure: impl Into<String>,
    ) -> bool {
        let record = if condition {
            println!("✓ {name}");
            CheckRecord::new(name, target, CheckStatus::Pass)
        } else {
            let failure = failure.into();
            println!("✗ {name} - {failure}");
            CheckRecord::new(name, target, CheckStatus::Fail).with_message(failure)
        };
        self.record(record);
        condition
    }

    /// Record a step that was deliberately not executed
    pub fn skip(&mut self, name: &str, target: &str, reason: impl Into<String>) {
        let reason = reason.into();
        println!("○ {name} - {reason}");
        self.record(CheckRecord::new(name, target, CheckStatus::Skip).with_message(reason));
    }

    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    pub fn tests_passed(&self) -> usize {
        self.tests_passed
    }

    pub fn all_passed(&self) -> bool {
        self.tests_run == self.tests_passed
    }

    /// Take the records collected since the last drain
    pub fn drain(&mut self) -> Vec<CheckRecord> {
        std::mem::take(&mut self.records)
    }
}
