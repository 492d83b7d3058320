//! Rows forwarded to the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::test_case::Outcome;

/// One test of one run, keyed by `test_id` and `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub title: String,
    pub test_id: String,
    /// Base name of the test file
    pub file: String,
    pub run: String,
    pub environment: String,
    pub outcome: Outcome,
    pub project_name: String,
    pub start_time: DateTime<Utc>,
}

/// Body of the bulk ingestion request.
#[derive(Debug, Serialize)]
pub struct HistoryBulkRequest<'a> {
    pub data: &'a [HistoryRow],
}
