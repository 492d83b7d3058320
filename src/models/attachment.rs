//! Attachment model shared by the run document and the report.

use serde::{Deserialize, Serialize};

/// A named, typed payload attached to a test attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    #[serde(flatten)]
    pub body: AttachmentBody,
}

/// Storage mode of an attachment. Exactly one is present on the wire as
/// `body`, `bodyBase64` or `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentBody {
    /// Inline text
    Body(String),
    /// Inline bytes
    BodyBase64(#[serde(with = "base64_bytes")] Vec<u8>),
    /// File on disk (input) or content-addressed URL (report)
    Path(String),
}

impl Attachment {
    /// Whether this is captured stdio text that may be merged with a neighbour.
    pub fn is_stdio_text(&self) -> bool {
        (self.name == "stdout" || self.name == "stderr") && self.content_type == "text/plain"
    }

    pub fn path(&self) -> Option<&str> {
        match &self.body {
            AttachmentBody::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            path: self.path().map(str::to_string),
        }
    }
}

/// Body-less view of an attachment used by list pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub name: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Serde adapter storing bytes as standard base64.
pub mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
