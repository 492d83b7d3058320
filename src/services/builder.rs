//! Report building pipeline.
//!
//! Walks the run tree, assembles per-file documents and the manifest,
//! packages them into a zip archive and uploads it to the artifact store.

use futures_util::future::{join, join_all};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::config::RunTarget;
use crate::error::{ReporterError, ReporterResult};
use crate::models::input::{ResultNode, RunInput, SourceLocation, SuiteNode, TestNode};
use crate::models::{
    Annotation, BuildWarning, Location, Outcome, RawAnnotation, Report, TestCase,
    TestCaseSummary, TestFile, TestFileSummary, TestResult, TestStep, WarningSink,
};
use crate::services::archive::{ARCHIVE_NAME, REPORT_ENTRY, ReportArchive};
use crate::services::attachments::AttachmentNormalizer;
use crate::services::failure::{format_error, format_result_failure};
use crate::services::identity::{self, ProjectOrdinals, relative_posix_path};
use crate::services::snippets::attach_snippets;
use crate::services::stats::{file_stats, sort_files, sort_tests, total_stats};
use crate::services::steps::{DedupedStep, dedupe_steps};
use crate::services::uploader::ArtifactUploader;

/// Stage of a build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Traversing,
    Aggregating,
    Packaging,
    Uploading,
    Done,
}

impl BuildPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traversing => "traversing",
            Self::Aggregating => "aggregating",
            Self::Packaging => "packaging",
            Self::Uploading => "uploading",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    /// Whether every file is free of unexpected and flaky tests
    pub ok: bool,
    /// Id of the only test, for runs with exactly one test
    pub single_test_id: Option<String>,
    pub report: Report,
    /// Degraded paths taken during the build
    pub warnings: Vec<BuildWarning>,
}

/// Full and summary form of one test.
struct TestEntry {
    case: TestCase,
    summary: TestCaseSummary,
}

/// What every test of one file suite shares.
struct FileContext<'a> {
    root_dir: &'a Path,
    file_id: &'a str,
    /// File path relative to the root directory, forward slashes
    file_path: &'a str,
    project_name: &'a str,
    project_ordinal: usize,
}

/// Builds and ships the report of one run.
pub struct ReportBuilder {
    target: RunTarget,
    uploader: ArtifactUploader,
    warnings: WarningSink,
}

impl ReportBuilder {
    pub fn new(target: RunTarget, uploader: ArtifactUploader) -> Self {
        ReportBuilder {
            target,
            uploader,
            warnings: WarningSink::default(),
        }
    }

    fn enter(&self, phase: BuildPhase) {
        info!(run = %self.target.run_name, "Report build: {}", phase);
    }

    /// Build the report, upload the archive and return the summary.
    ///
    /// Fails when a file suite has no location, when packaging fails or
    /// when the archive upload fails. Attachment and snippet problems only
    /// produce warnings.
    pub async fn build(&self, run: &RunInput) -> ReporterResult<BuildResult> {
        self.warnings.take();

        self.enter(BuildPhase::Traversing);
        let (mut files, mut summaries) = self.traverse(run).await?;

        self.enter(BuildPhase::Aggregating);
        attach_snippets(&run.root_dir, &mut files, &self.warnings).await;

        for summary in &mut summaries {
            summary.stats = file_stats(&summary.tests);
            sort_tests(&mut summary.tests);
        }
        let ok = summaries.iter().all(|s| s.stats.ok);
        let stats = total_stats(&summaries);
        sort_files(&mut summaries);

        let report = Report {
            metadata: run.metadata.clone(),
            start_time: run.start_time.timestamp_millis(),
            duration: run.duration,
            files: summaries,
            project_names: run.projects.iter().map(|p| p.name.clone()).collect(),
            stats,
            errors: run.errors.iter().map(format_error).collect(),
            env: self.target.environment.clone(),
            run_name: self.target.run_name.clone(),
        };

        self.enter(BuildPhase::Packaging);
        let mut archive = ReportArchive::new();
        for file in &files {
            archive.add_json(&format!("{}.json", file.file_id), file)?;
        }
        archive.add_json(REPORT_ENTRY, &report)?;
        let entries = archive.len();
        let bytes = archive.finish()?;

        self.enter(BuildPhase::Uploading);
        let size = bytes.len();
        self.uploader.upload(ARCHIVE_NAME, bytes).await?;
        info!(
            "Uploaded {} ({} entries, {} bytes) to {}",
            ARCHIVE_NAME,
            entries,
            size,
            self.target.report_url()
        );

        let single_test_id = if report.stats.total == 1 {
            files
                .iter()
                .flat_map(|f| &f.tests)
                .next()
                .map(|t| t.test_id.clone())
        } else {
            None
        };

        self.enter(BuildPhase::Done);
        Ok(BuildResult {
            ok,
            single_test_id,
            report,
            warnings: self.warnings.take(),
        })
    }

    /// Visit every file suite and group the resulting tests by file id.
    ///
    /// The same file may appear under several projects; its tests are
    /// appended to one group in project order.
    async fn traverse(&self, run: &RunInput) -> ReporterResult<(Vec<TestFile>, Vec<TestFileSummary>)> {
        let mut files: Vec<TestFile> = Vec::new();
        let mut summaries: Vec<TestFileSummary> = Vec::new();
        let mut groups: HashMap<String, usize> = HashMap::new();
        let mut ordinals = ProjectOrdinals::default();

        for (project_index, project) in run.projects.iter().enumerate() {
            for file_suite in &project.suites {
                let location = file_suite.location.as_ref().ok_or_else(|| {
                    ReporterError::InvalidInput(format!(
                        "File suite '{}' of project '{}' has no location",
                        file_suite.title, project.name
                    ))
                })?;

                let file_name = relative_posix_path(&run.root_dir, &location.file);
                let file_id =
                    identity::file_id(&relative_posix_path(&project.test_dir, &location.file));

                let index = *groups.entry(file_id.clone()).or_insert_with(|| {
                    files.push(TestFile {
                        file_id: file_id.clone(),
                        file_name: file_name.clone(),
                        tests: Vec::new(),
                    });
                    summaries.push(TestFileSummary {
                        file_id: file_id.clone(),
                        file_name: file_name.clone(),
                        tests: Vec::new(),
                        stats: Default::default(),
                    });
                    files.len() - 1
                });

                if file_suite.test_count() == 0 {
                    continue;
                }

                let ctx = FileContext {
                    root_dir: &run.root_dir,
                    file_id: &file_id,
                    file_path: &file_name,
                    project_name: &project.name,
                    project_ordinal: ordinals.ordinal(project_index),
                };
                for entry in self.process_suite(&ctx, file_suite, &[]).await {
                    files[index].tests.push(entry.case);
                    summaries[index].tests.push(entry.summary);
                }
            }
        }

        info!(
            "Collected {} tests in {} files",
            files.iter().map(|f| f.tests.len()).sum::<usize>(),
            files.len()
        );
        Ok((files, summaries))
    }

    /// All tests below `suite`, nested suites first, in declaration order.
    ///
    /// `path` holds the describe titles leading to `suite` (the file suite
    /// itself contributes none).
    async fn process_suite(
        &self,
        ctx: &FileContext<'_>,
        suite: &SuiteNode,
        path: &[String],
    ) -> Vec<TestEntry> {
        let nested = join_all(suite.suites.iter().map(|child| {
            let mut child_path = path.to_vec();
            child_path.push(child.title.clone());
            async move { Box::pin(self.process_suite(ctx, child, &child_path)).await }
        }));
        let tests = join_all(
            suite
                .tests
                .iter()
                .map(|test| self.create_test_entry(ctx, test, path)),
        );

        let (nested, tests) = join(nested, tests).await;
        nested.into_iter().flatten().chain(tests).collect()
    }

    async fn create_test_entry(
        &self,
        ctx: &FileContext<'_>,
        test: &TestNode,
        path: &[String],
    ) -> TestEntry {
        let titles: Vec<&str> = path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(test.title.as_str()))
            .collect();
        let test_id = identity::test_id(
            ctx.file_id,
            ctx.project_ordinal,
            ctx.file_path,
            &titles,
            test.repeat_each_index,
        );

        let results = join_all(
            test.results
                .iter()
                .map(|result| self.create_test_result(ctx, test, result)),
        )
        .await;

        let outcome = Outcome::from_attempts(test.expected_status, test.results.iter().map(|r| r.status));

        let case = TestCase {
            test_id,
            title: test.title.clone(),
            project_name: ctx.project_name.to_string(),
            location: relative_location(ctx.root_dir, &test.location),
            duration: test.results.iter().map(|r| r.duration).sum(),
            annotations: test.annotations.iter().map(to_annotation).collect(),
            tags: test.tags.clone(),
            outcome,
            path: path.to_vec(),
            results,
            ok: outcome.is_ok(),
        };
        let summary = case.summary();

        TestEntry { case, summary }
    }

    async fn create_test_result(
        &self,
        ctx: &FileContext<'_>,
        test: &TestNode,
        result: &ResultNode,
    ) -> TestResult {
        let normalizer = AttachmentNormalizer::new(&self.uploader, &self.target, &self.warnings);
        let attachments = normalizer.normalize(result.collect_attachments()).await;

        TestResult {
            retry: result.retry,
            start_time: result.start_time,
            duration: result.duration,
            status: result.status,
            steps: dedupe_steps(&result.steps)
                .into_iter()
                .map(|step| create_test_step(ctx.root_dir, step))
                .collect(),
            attachments,
            errors: format_result_failure(test.expected_status, result),
        }
    }
}

fn create_test_step(root_dir: &Path, deduped: DedupedStep<'_>) -> TestStep {
    let DedupedStep {
        step,
        count,
        duration,
    } = deduped;

    TestStep {
        title: step.title.clone(),
        start_time: step.start_time,
        duration,
        steps: dedupe_steps(&step.steps)
            .into_iter()
            .map(|child| create_test_step(root_dir, child))
            .collect(),
        location: step
            .location
            .as_ref()
            .map(|loc| relative_location(root_dir, loc)),
        error: step.error.as_ref().and_then(|e| e.message.clone()),
        snippet: None,
        count,
    }
}

fn relative_location(root_dir: &Path, location: &SourceLocation) -> Location {
    Location {
        file: relative_posix_path(root_dir, &location.file),
        line: location.line,
        column: location.column,
    }
}

/// Annotation descriptions may be any JSON value; the report keeps text.
fn to_annotation(raw: &RawAnnotation) -> Annotation {
    let description = match &raw.description {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    Annotation {
        kind: raw.kind.clone(),
        description,
    }
}
