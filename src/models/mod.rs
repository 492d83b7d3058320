//! Domain models for the summary reporter.
//!
//! `input` mirrors the runner's read-only result tree; the remaining modules
//! describe what ends up in the report archive and the history store.

pub mod attachment;
pub mod history;
pub mod input;
pub mod report;
pub mod test_case;
pub mod warning;

// Re-export commonly used types
pub use attachment::{Attachment, AttachmentBody, AttachmentSummary};
pub use history::{HistoryBulkRequest, HistoryRow};
pub use input::{
    ProjectSuite, RawAnnotation, ResultNode, RunInput, SourceLocation, StdioChunk, StdioStream,
    StepNode, SuiteNode, TestError, TestNode,
};
pub use report::{Report, Stats, TestFile, TestFileSummary};
pub use test_case::{
    Annotation, Location, Outcome, TestCase, TestCaseSummary, TestResult, TestResultSummary,
    TestStatus, TestStep,
};
pub use warning::{BuildWarning, WarningSink};
