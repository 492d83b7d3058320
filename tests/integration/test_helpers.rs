//! Shared fixtures for the integration tests.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use summary_reporter::config::{Config, RunTarget};
use summary_reporter::models::RunInput;
use summary_reporter::services::uploader::build_http_client;
use summary_reporter::services::{ArtifactUploader, ReportBuilder};
use tempfile::TempDir;

use super::mock_artifact_store::MockArtifactStore;

pub const START_TIME: &str = "2024-03-05T10:20:30.123Z";
pub const RUN_NAME: &str = "run_2024-03-05_10-20-30.123";
pub const ENVIRONMENT: &str = "ci";

/// Project checkout on disk: `<root>/tests/...`.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn test_dir(&self) -> PathBuf {
        self.root().join("tests")
    }

    /// Write a file below the root and return its absolute path.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write a test source file of ten numbered lines.
    pub fn write_source(&self, relative: &str) -> PathBuf {
        let source = (1..=10)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        self.write(relative, source)
    }
}

pub fn test_config(store: &MockArtifactStore) -> Config {
    Config {
        environment: ENVIRONMENT.to_string(),
        api: store.base_url.clone(),
        max_concurrent_uploads: 4,
        upload_timeout_secs: 10,
    }
}

pub fn test_builder(store: &MockArtifactStore) -> (ReportBuilder, RunTarget) {
    let config = test_config(store);
    let target = RunTarget::new(&config, RUN_NAME);
    let uploader = ArtifactUploader::new(build_http_client(&config).unwrap(), &target, 4);
    (ReportBuilder::new(target.clone(), uploader), target)
}

pub fn step(file: &Path, title: &str, line: u32, duration: i64) -> Value {
    json!({
        "title": title,
        "category": "pw:api",
        "startTime": START_TIME,
        "duration": duration,
        "location": { "file": file, "line": line, "column": 3 }
    })
}

pub fn result(status: &str, steps: Vec<Value>, attachments: Vec<Value>) -> Value {
    json!({
        "retry": 0,
        "startTime": START_TIME,
        "duration": 25,
        "status": status,
        "steps": steps,
        "attachments": attachments
    })
}

pub fn test(file: &Path, title: &str, line: u32, results: Vec<Value>) -> Value {
    json!({
        "title": title,
        "location": { "file": file, "line": line, "column": 5 },
        "results": results
    })
}

pub fn passing_test(file: &Path, title: &str) -> Value {
    test(file, title, 3, vec![result("passed", vec![], vec![])])
}

pub fn failing_test(file: &Path, title: &str) -> Value {
    test(file, title, 3, vec![result("failed", vec![], vec![])])
}

pub fn describe(title: &str, suites: Vec<Value>, tests: Vec<Value>) -> Value {
    json!({ "title": title, "suites": suites, "tests": tests })
}

pub fn file_suite(file: &Path, suites: Vec<Value>, tests: Vec<Value>) -> Value {
    json!({
        "title": file.file_name().unwrap().to_string_lossy(),
        "location": { "file": file, "line": 0, "column": 0 },
        "suites": suites,
        "tests": tests
    })
}

pub fn project(name: &str, test_dir: &Path, suites: Vec<Value>) -> Value {
    json!({ "name": name, "testDir": test_dir, "suites": suites })
}

pub fn run_input(workspace: &Workspace, projects: Vec<Value>) -> RunInput {
    serde_json::from_value(json!({
        "rootDir": workspace.root(),
        "metadata": { "ci": true },
        "startTime": START_TIME,
        "duration": 1500,
        "projects": projects
    }))
    .expect("invalid run fixture")
}

/// Entries of an uploaded archive, parsed as JSON.
pub fn read_archive(bytes: &[u8]) -> HashMap<String, Value> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("not a zip archive");
    let mut entries = HashMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        entries.insert(entry.name().to_string(), serde_json::from_str(&content).unwrap());
    }
    entries
}
