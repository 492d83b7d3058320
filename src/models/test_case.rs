//! Test case, attempt and step models written to the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::{Attachment, AttachmentSummary};

/// Test execution status of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    #[serde(rename = "timedOut")]
    TimedOut,
    Skipped,
    Interrupted,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Skipped => "skipped",
            Self::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run-level classification of a test, derived from its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Expected,
    Unexpected,
    Flaky,
    Skipped,
}

impl Outcome {
    /// Classify a test from the statuses of its attempts.
    ///
    /// Interrupted attempts are ignored. A test whose remaining attempts are
    /// all skipped is skipped; otherwise it is expected when no attempt
    /// deviates from `expected_status`, unexpected when all of them do and
    /// flaky in between.
    pub fn from_attempts(
        expected_status: TestStatus,
        statuses: impl IntoIterator<Item = TestStatus>,
    ) -> Self {
        let statuses: Vec<_> = statuses
            .into_iter()
            .filter(|s| *s != TestStatus::Interrupted)
            .collect();

        if statuses.iter().all(|s| *s == TestStatus::Skipped) {
            return Self::Skipped;
        }

        let failures = statuses.iter().filter(|s| **s != expected_status).count();
        if failures == 0 {
            Self::Expected
        } else if failures == statuses.len() {
            Self::Unexpected
        } else {
            Self::Flaky
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Unexpected => "unexpected",
            Self::Flaky => "flaky",
            Self::Skipped => "skipped",
        }
    }

    /// Whether the test counts as passing.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Expected | Self::Flaky)
    }

    /// Presentation weight; higher sorts first.
    pub fn weight(&self) -> u64 {
        match self {
            Self::Unexpected => 1000,
            Self::Flaky => 1,
            Self::Expected | Self::Skipped => 0,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source position relative to the run's root directory, forward slashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full form of a test, written to the per-file document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub test_id: String,
    pub title: String,
    pub project_name: String,
    pub location: Location,
    pub duration: i64,
    pub annotations: Vec<Annotation>,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    /// Describe-block titles between the file and the test
    pub path: Vec<String>,
    pub results: Vec<TestResult>,
    pub ok: bool,
}

/// Light form of a test, listed in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSummary {
    pub test_id: String,
    pub title: String,
    pub project_name: String,
    pub location: Location,
    pub duration: i64,
    pub annotations: Vec<Annotation>,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub path: Vec<String>,
    pub ok: bool,
    pub results: Vec<TestResultSummary>,
}

impl TestCase {
    /// Derive the summary form; both forms share the same `test_id`.
    pub fn summary(&self) -> TestCaseSummary {
        TestCaseSummary {
            test_id: self.test_id.clone(),
            title: self.title.clone(),
            project_name: self.project_name.clone(),
            location: self.location.clone(),
            duration: self.duration,
            annotations: self.annotations.clone(),
            tags: self.tags.clone(),
            outcome: self.outcome,
            path: self.path.clone(),
            ok: self.ok,
            results: self
                .results
                .iter()
                .map(|r| TestResultSummary {
                    attachments: r.attachments.iter().map(Attachment::summary).collect(),
                })
                .collect(),
        }
    }
}

/// One attempt of a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub retry: u32,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    pub status: TestStatus,
    pub steps: Vec<TestStep>,
    pub attachments: Vec<Attachment>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultSummary {
    pub attachments: Vec<AttachmentSummary>,
}

/// A (possibly deduplicated) step of an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub title: String,
    pub start_time: DateTime<Utc>,
    /// Summed duration of all merged repetitions
    pub duration: i64,
    pub steps: Vec<TestStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Number of consecutive identical steps merged into this one
    pub count: u32,
}

impl TestStep {
    /// Visit this step and all of its descendants, parents first.
    pub fn walk(&self, f: &mut impl FnMut(&TestStep)) {
        f(self);
        for child in &self.steps {
            child.walk(f);
        }
    }

    /// Mutable counterpart of [`TestStep::walk`].
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut TestStep)) {
        f(self);
        for child in &mut self.steps {
            child.walk_mut(f);
        }
    }
}
