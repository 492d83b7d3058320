//! End-of-run orchestration: name the run, build and ship the report, then
//! forward one history row per test.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::config::{Config, RunTarget};
use crate::error::{ReporterError, ReporterResult};
use crate::models::{HistoryBulkRequest, HistoryRow, Report, RunInput};
use crate::services::builder::{BuildResult, ReportBuilder};
use crate::services::uploader::{ArtifactUploader, build_http_client};

/// Run name derived from the run's start: `run_2024-03-05_10-20-30.123`.
pub fn run_name(start_time: DateTime<Utc>) -> String {
    format!("run_{}", start_time.format("%Y-%m-%d_%H-%M-%S%.3f"))
}

/// One row per test of the report, in manifest order.
pub fn history_rows(report: &Report, target: &RunTarget, start_time: DateTime<Utc>) -> Vec<HistoryRow> {
    report
        .files
        .iter()
        .flat_map(|file| {
            let base_name = file
                .file_name
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .to_string();
            file.tests.iter().map(move |test| HistoryRow {
                title: test.title.clone(),
                test_id: test.test_id.clone(),
                file: base_name.clone(),
                run: target.run_name.clone(),
                environment: target.environment.clone(),
                outcome: test.outcome,
                project_name: test.project_name.clone(),
                start_time,
            })
        })
        .collect()
}

/// Client of the history store's bulk ingestion endpoint.
pub struct HistoryClient {
    client: reqwest::Client,
    url: String,
}

impl HistoryClient {
    pub fn new(client: reqwest::Client, target: &RunTarget) -> Self {
        HistoryClient {
            client,
            url: target.history_url(),
        }
    }

    /// `POST /api/history/bulk` with `{ "data": rows }`.
    pub async fn bulk_load(&self, rows: &[HistoryRow]) -> ReporterResult<JsonValue> {
        let response = self
            .client
            .post(&self.url)
            .json(&HistoryBulkRequest { data: rows })
            .send()
            .await
            .map_err(|e| ReporterError::History(format!("Failed to post history: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::History(format!(
                "History store returned status {}",
                status
            )));
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| ReporterError::History(format!("Invalid history response: {}", e)))
    }
}

/// What a finished run reports back to the invoking process.
#[derive(Debug)]
pub struct RunSummary {
    pub report_url: String,
    pub build: BuildResult,
    pub history_rows: usize,
}

/// Build and upload the report of `run`, then forward its history rows.
pub async fn report_run(config: &Config, run: &RunInput) -> ReporterResult<RunSummary> {
    let target = RunTarget::new(config, run_name(run.start_time));
    let report_url = target.report_url();
    info!("report_url: {}", report_url);

    let client = build_http_client(config)?;
    let uploader = ArtifactUploader::new(client.clone(), &target, config.max_concurrent_uploads);
    let builder = ReportBuilder::new(target.clone(), uploader);
    let build = builder.build(run).await?;

    let rows = history_rows(&build.report, &target, run.start_time);
    let ack = HistoryClient::new(client, &target).bulk_load(&rows).await?;
    info!("Forwarded {} history rows: {}", rows.len(), ack);

    Ok(RunSummary {
        report_url,
        build,
        history_rows: rows.len(),
    })
}
