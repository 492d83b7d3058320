//! Attachment normalization.
//!
//! Every attachment of an attempt ends up in one of three storage modes:
//! inline text, inline bytes (only when an upload failed) or a reference to a
//! content-addressed blob in the run's namespace of the artifact store.

use futures_util::future::join_all;
use std::path::Path;
use tracing::debug;

use crate::config::RunTarget;
use crate::models::{Attachment, AttachmentBody, BuildWarning, WarningSink};
use crate::services::failure::strip_ansi;
use crate::services::identity::content_hash;
use crate::services::uploader::ArtifactUploader;

/// Extension used when neither the name nor the content type suggests one.
const FALLBACK_EXTENSION: &str = "dat";

/// Whether a body of this content type is meant to be read as text.
pub fn is_text_content_type(content_type: &str) -> bool {
    content_type.starts_with("text/") || content_type.starts_with("application/json")
}

/// Charset parameter of a content type, lowercased (e.g. "text/html; charset=UTF-8").
pub fn charset_of(content_type: &str) -> Option<String> {
    let (_, rest) = content_type.split_once("charset=")?;
    let charset = rest
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"')
        .to_lowercase();
    (!charset.is_empty()).then_some(charset)
}

/// Decode bytes with the given charset. `None` when the bytes are not valid
/// in that charset or the charset is unsupported.
pub fn decode_text(bytes: &[u8], charset: &str) -> Option<String> {
    match charset {
        "utf-8" | "utf8" => String::from_utf8(bytes.to_vec()).ok(),
        "ascii" | "us-ascii" => bytes
            .is_ascii()
            .then(|| bytes.iter().map(|b| *b as char).collect()),
        "latin1" | "iso-8859-1" | "binary" => Some(bytes.iter().map(|b| *b as char).collect()),
        "utf-16le" | "utf16le" | "ucs2" | "ucs-2" => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}

/// Replace runs of characters unsafe in file names with `-`.
///
/// ASCII letters, digits, `-` and non-ASCII characters are kept.
pub fn sanitize_for_file_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || !c.is_ascii() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Typical file extension of a content type, without the dot.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let ext = match essence.as_str() {
        "text/html" => "html",
        "text/css" => "css",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "text/csv" => "csv",
        "application/javascript" | "text/javascript" => "js",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "application/zip" => "zip",
        "application/pdf" => "pdf",
        "application/octet-stream" => "bin",
        "image/png" => "png",
        "image/jpeg" => "jpeg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" => "ico",
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        "font/woff" => "woff",
        "font/woff2" => "woff2",
        "font/ttf" => "ttf",
        "application/vnd.ms-fontobject" => "eot",
        _ => return None,
    };
    Some(ext)
}

/// Extension of an in-memory blob: from its name, else its content type.
fn blob_extension(attachment: &Attachment) -> String {
    let from_name = Path::new(&attachment.name)
        .extension()
        .map(|ext| sanitize_for_file_path(&ext.to_string_lossy()))
        .filter(|ext| !ext.is_empty());

    from_name.unwrap_or_else(|| {
        extension_for_content_type(&attachment.content_type)
            .unwrap_or(FALLBACK_EXTENSION)
            .to_string()
    })
}

/// Fold consecutive stdio text chunks of the same stream into one attachment.
///
/// Control sequences are stripped from every stdio text body. Other
/// attachments pass through untouched and break a run.
pub fn merge_stdio(attachments: Vec<Attachment>) -> Vec<Attachment> {
    let mut kept: Vec<Attachment> = Vec::with_capacity(attachments.len());

    for mut attachment in attachments {
        let text = match &attachment.body {
            AttachmentBody::Body(text) if attachment.is_stdio_text() => strip_ansi(text),
            _ => {
                kept.push(attachment);
                continue;
            }
        };
        if let Some(last) = kept.last_mut()
            && last.is_stdio_text()
            && last.name == attachment.name
            && last.content_type == attachment.content_type
            && let AttachmentBody::Body(existing) = &mut last.body
        {
            existing.push_str(&text);
            continue;
        }

        attachment.body = AttachmentBody::Body(text);
        kept.push(attachment);
    }

    kept
}

/// Normalizes the attachments of attempts, uploading blobs on the way.
pub struct AttachmentNormalizer<'a> {
    uploader: &'a ArtifactUploader,
    target: &'a RunTarget,
    warnings: &'a WarningSink,
}

impl<'a> AttachmentNormalizer<'a> {
    pub fn new(uploader: &'a ArtifactUploader, target: &'a RunTarget, warnings: &'a WarningSink) -> Self {
        AttachmentNormalizer {
            uploader,
            target,
            warnings,
        }
    }

    /// Normalize one attempt's attachments, in input order.
    ///
    /// Uploads run concurrently; the output is positional. Never fails:
    /// degraded attachments are reported through the warning sink.
    pub async fn normalize(&self, attachments: Vec<Attachment>) -> Vec<Attachment> {
        let merged = merge_stdio(attachments);
        join_all(merged.into_iter().map(|a| self.normalize_one(a))).await
    }

    async fn normalize_one(&self, attachment: Attachment) -> Attachment {
        match attachment.body {
            AttachmentBody::Path(ref path) => {
                let path = path.clone();
                self.upload_file(attachment, path).await
            }
            AttachmentBody::BodyBase64(ref bytes) => {
                if is_text_content_type(&attachment.content_type) {
                    let charset = charset_of(&attachment.content_type)
                        .unwrap_or_else(|| "utf-8".to_string());
                    match decode_text(bytes, &charset) {
                        Some(text) => {
                            return Attachment {
                                body: AttachmentBody::Body(text),
                                ..attachment
                            };
                        }
                        None => self.warnings.push(BuildWarning::TextDecodeFailed {
                            name: attachment.name.clone(),
                            charset,
                        }),
                    }
                }
                self.upload_bytes(attachment).await
            }
            AttachmentBody::Body(_) => attachment,
        }
    }

    /// Upload a file-backed attachment. On failure the local path is kept.
    async fn upload_file(&self, attachment: Attachment, path: String) -> Attachment {
        let uploaded = async {
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| format!("cannot read {}: {}", path, e))?;
            let extension = Path::new(&path)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let name = format!("{}{}", content_hash(&data), extension);
            self.uploader
                .upload(&name, data)
                .await
                .map_err(|e| e.to_string())?;
            Ok::<_, String>(name)
        }
        .await;

        match uploaded {
            Ok(name) => {
                debug!("Attachment '{}' stored as {}", attachment.name, name);
                Attachment {
                    body: AttachmentBody::Path(self.target.blob_url(&name)),
                    ..attachment
                }
            }
            Err(reason) => {
                self.warnings.push(BuildWarning::AttachmentUploadFailed {
                    name: attachment.name.clone(),
                    kept: path,
                    reason,
                });
                attachment
            }
        }
    }

    /// Upload an in-memory body. On failure the bytes stay inline.
    async fn upload_bytes(&self, attachment: Attachment) -> Attachment {
        let AttachmentBody::BodyBase64(bytes) = &attachment.body else {
            return attachment;
        };

        let name = format!("{}.{}", content_hash(bytes), blob_extension(&attachment));
        match self.uploader.upload(&name, bytes.clone()).await {
            Ok(_) => {
                debug!("Attachment '{}' stored as {}", attachment.name, name);
                Attachment {
                    body: AttachmentBody::Path(self.target.blob_url(&name)),
                    ..attachment
                }
            }
            Err(e) => {
                self.warnings.push(BuildWarning::AttachmentUploadFailed {
                    name: attachment.name.clone(),
                    kept: "inline body".to_string(),
                    reason: e.to_string(),
                });
                attachment
            }
        }
    }
}
