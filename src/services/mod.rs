//! Report building services.

pub mod archive;
pub mod attachments;
pub mod builder;
pub mod failure;
pub mod identity;
pub mod reporter;
pub mod snippets;
pub mod stats;
pub mod steps;
pub mod uploader;

pub use builder::{BuildPhase, BuildResult, ReportBuilder};
pub use reporter::{RunSummary, report_run};
pub use uploader::ArtifactUploader;
