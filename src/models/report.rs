//! Report manifest and per-file documents.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::test_case::{Outcome, TestCase, TestCaseSummary};

/// Per-outcome counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub expected: u64,
    pub unexpected: u64,
    pub flaky: u64,
    pub skipped: u64,
    /// `unexpected == 0 && flaky == 0`
    pub ok: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            total: 0,
            expected: 0,
            unexpected: 0,
            flaky: 0,
            skipped: 0,
            ok: true,
        }
    }
}

impl Stats {
    /// Count one test.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Expected => self.expected += 1,
            Outcome::Unexpected => self.unexpected += 1,
            Outcome::Flaky => self.flaky += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        self.total += 1;
        self.ok = self.unexpected == 0 && self.flaky == 0;
    }

    /// Element-wise sum.
    pub fn add(&mut self, delta: &Stats) {
        self.total += delta.total;
        self.expected += delta.expected;
        self.unexpected += delta.unexpected;
        self.flaky += delta.flaky;
        self.skipped += delta.skipped;
        self.ok = self.ok && delta.ok;
    }

    /// Presentation weight; higher sorts first.
    pub fn weight(&self) -> u64 {
        self.unexpected * 1000 + self.flaky
    }
}

/// Full per-file document, stored as `{fileId}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFile {
    pub file_id: String,
    pub file_name: String,
    pub tests: Vec<TestCase>,
}

/// Per-file entry of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileSummary {
    pub file_id: String,
    pub file_name: String,
    pub tests: Vec<TestCaseSummary>,
    pub stats: Stats,
}

/// Root manifest of a run, stored as `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Opaque metadata passed through from the run
    pub metadata: JsonValue,
    /// Run start in epoch milliseconds
    pub start_time: i64,
    pub duration: i64,
    pub files: Vec<TestFileSummary>,
    pub project_names: Vec<String>,
    pub stats: Stats,
    pub errors: Vec<String>,
    pub env: String,
    pub run_name: String,
}
