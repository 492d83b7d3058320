//! Run document produced by the test runner.
//!
//! The tree is read-only: the report builder borrows it for the whole build
//! and never mutates it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

use super::attachment::{Attachment, AttachmentBody};
use super::test_case::TestStatus;

/// Root of a finished run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    /// Directory locations in the report are made relative to
    pub root_dir: PathBuf,
    /// Free-form metadata, passed through to the manifest
    #[serde(default)]
    pub metadata: JsonValue,
    /// Wall-clock start of the run
    pub start_time: DateTime<Utc>,
    /// Total run duration in milliseconds
    #[serde(default)]
    pub duration: i64,
    /// One suite per configured project, in declaration order
    #[serde(default)]
    pub projects: Vec<ProjectSuite>,
    /// Errors raised outside of any test (global setup, config, ...)
    #[serde(default)]
    pub errors: Vec<TestError>,
}

impl RunInput {
    /// Total number of tests in the tree.
    pub fn test_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| p.suites.iter())
            .map(SuiteNode::test_count)
            .sum()
    }
}

/// Top-level suite of one project; its children are file suites.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSuite {
    pub name: String,
    /// Root that file ids are computed against
    pub test_dir: PathBuf,
    #[serde(default)]
    pub suites: Vec<SuiteNode>,
}

/// File or describe-block suite.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteNode {
    pub title: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub suites: Vec<SuiteNode>,
    #[serde(default)]
    pub tests: Vec<TestNode>,
}

impl SuiteNode {
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.suites.iter().map(SuiteNode::test_count).sum::<usize>()
    }
}

/// Source position as reported by the runner (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

/// Annotation attached to a test; the description may be any JSON value.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnnotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<JsonValue>,
}

/// A single test declaration with all of its attempts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNode {
    pub title: String,
    pub location: SourceLocation,
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_expected_status")]
    pub expected_status: TestStatus,
    /// Zero-based index of this logical test under `--repeat-each`
    #[serde(default)]
    pub repeat_each_index: u32,
    #[serde(default)]
    pub results: Vec<ResultNode>,
}

fn default_expected_status() -> TestStatus {
    TestStatus::Passed
}

/// One attempt of a test.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultNode {
    #[serde(default)]
    pub retry: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub duration: i64,
    pub status: TestStatus,
    #[serde(default)]
    pub steps: Vec<StepNode>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub stdout: Vec<StdioChunk>,
    #[serde(default)]
    pub stderr: Vec<StdioChunk>,
    #[serde(default)]
    pub errors: Vec<TestError>,
}

/// A recorded step within an attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNode {
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub start_time: DateTime<Utc>,
    /// Milliseconds; negative while the step never finished
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub error: Option<TestError>,
    #[serde(default)]
    pub steps: Vec<StepNode>,
}

/// Error as reported by the runner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestError {
    #[serde(default)]
    pub message: Option<String>,
    /// Stringified thrown value, for non-Error throws
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

/// Captured chunk of stdout/stderr.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StdioChunk {
    Text {
        text: String,
    },
    Buffer {
        #[serde(with = "super::attachment::base64_bytes")]
        buffer: Vec<u8>,
    },
}

/// Captured output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioStream {
    Stdout,
    Stderr,
}

impl StdioStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl StdioChunk {
    /// Synthesize the attachment for this chunk (`stdout`/`stderr`).
    pub fn into_attachment(self, stream: StdioStream) -> Attachment {
        let name = stream.as_str().to_string();
        match self {
            StdioChunk::Text { text } => Attachment {
                name,
                content_type: "text/plain".to_string(),
                body: AttachmentBody::Body(text),
            },
            StdioChunk::Buffer { buffer } => Attachment {
                name,
                content_type: "application/octet-stream".to_string(),
                body: AttachmentBody::BodyBase64(buffer),
            },
        }
    }
}

impl ResultNode {
    /// All attachments of the attempt in processing order: explicit
    /// attachments, then stdout chunks, then stderr chunks.
    pub fn collect_attachments(&self) -> Vec<Attachment> {
        let stdout = self
            .stdout
            .iter()
            .cloned()
            .map(|c| c.into_attachment(StdioStream::Stdout));
        let stderr = self
            .stderr
            .iter()
            .cloned()
            .map(|c| c.into_attachment(StdioStream::Stderr));

        self.attachments
            .iter()
            .cloned()
            .chain(stdout)
            .chain(stderr)
            .collect()
    }
}
