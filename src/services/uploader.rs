//! Multipart upload client for the artifact store.

use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::{Config, RunTarget};
use crate::error::{ReporterError, ReporterResult};

/// HTTP connect timeout for artifact store calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the multipart field carrying the payload.
const FILE_FIELD: &str = "file";

/// Build an HTTP client with timeouts.
pub fn build_http_client(config: &Config) -> ReporterResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(config.upload_timeout_secs))
        .build()?;
    Ok(client)
}

/// Uploads named payloads into one run's namespace.
///
/// Clones share the HTTP client and the in-flight limit.
#[derive(Clone)]
pub struct ArtifactUploader {
    client: reqwest::Client,
    upload_url: String,
    semaphore: Arc<Semaphore>,
}

impl ArtifactUploader {
    pub fn new(client: reqwest::Client, target: &RunTarget, max_concurrent_uploads: usize) -> Self {
        ArtifactUploader {
            client,
            upload_url: target.upload_url(),
            semaphore: Arc::new(Semaphore::new(max_concurrent_uploads.max(1))),
        }
    }

    /// `POST /api/upload` with a single file part; returns the store's
    /// acknowledgement.
    pub async fn upload(&self, file_name: &str, data: Vec<u8>) -> ReporterResult<JsonValue> {
        // Acquire upload permit (bounds concurrent connections)
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ReporterError::Upload(format!("Upload queue closed: {}", e)))?;

        let size = data.len();
        let part = Part::bytes(data).file_name(file_name.to_string());
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReporterError::Upload(format!("Failed to upload {}: {}", file_name, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::Upload(format!(
                "Artifact store rejected {} with status {}",
                file_name, status
            )));
        }

        let ack = response.json::<JsonValue>().await.map_err(|e| {
            ReporterError::Upload(format!("Invalid acknowledgement for {}: {}", file_name, e))
        })?;

        debug!("Uploaded {} ({} bytes)", file_name, size);
        Ok(ack)
    }
}
