//! Degraded-path notices collected during a build.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Something went wrong but the build carried on with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildWarning {
    /// Attachment blob could not be uploaded; the original reference was kept
    AttachmentUploadFailed {
        name: String,
        kept: String,
        reason: String,
    },
    /// Source file for step snippets could not be read; snippets were omitted
    SnippetSourceUnreadable { file: String, reason: String },
    /// Textual body could not be decoded; it was stored as a blob instead
    TextDecodeFailed { name: String, charset: String },
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AttachmentUploadFailed { name, kept, reason } => write!(
                f,
                "upload of attachment '{}' failed, keeping '{}': {}",
                name, kept, reason
            ),
            Self::SnippetSourceUnreadable { file, reason } => {
                write!(f, "cannot read {} for snippets: {}", file, reason)
            }
            Self::TextDecodeFailed { name, charset } => write!(
                f,
                "attachment '{}' is not valid {}, storing as blob",
                name, charset
            ),
        }
    }
}

/// Shared collector handed to the concurrent parts of a build.
#[derive(Debug, Clone, Default)]
pub struct WarningSink(Arc<Mutex<Vec<BuildWarning>>>);

impl WarningSink {
    pub fn push(&self, warning: BuildWarning) {
        warn!("{}", warning);
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(warning);
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<BuildWarning> {
        std::mem::take(
            &mut *self
                .0
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}
