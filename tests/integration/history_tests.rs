//! End-to-end runs through `report_run`, including history forwarding.

use summary_reporter::error::ReporterError;
use summary_reporter::services::report_run;

use super::mock_artifact_store::{ARCHIVE_NAME, MockArtifactStore};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_report_run_posts_history_rows() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/auth/login.spec.ts");

    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![passing_test(&login, "logs in"), failing_test(&login, "logs out")],
            )],
        )],
    );

    let summary = report_run(&test_config(&store), &run).await.unwrap();
    assert_eq!(
        summary.report_url,
        format!("{}/{}/{}", store.base_url, ENVIRONMENT, RUN_NAME)
    );
    assert_eq!(summary.history_rows, 2);
    assert!(store.upload_named(ARCHIVE_NAME).is_some());

    let history = store.history();
    assert_eq!(history.len(), 1);
    let rows = history[0]["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    // Manifest order: the failing test comes first
    assert_eq!(rows[0]["title"], "logs out");
    assert_eq!(rows[0]["outcome"], "unexpected");
    assert_eq!(rows[1]["outcome"], "expected");
    for row in rows {
        assert_eq!(row["file"], "login.spec.ts");
        assert_eq!(row["run"], RUN_NAME);
        assert_eq!(row["environment"], ENVIRONMENT);
        assert_eq!(row["projectName"], "chromium");
        assert_eq!(row["startTime"], "2024-03-05T10:20:30.123Z");
    }
    assert_eq!(
        rows[0]["testId"],
        summary.build.report.files[0].tests[0].test_id.as_str()
    );
}

#[actix_rt::test]
async fn test_history_failure_surfaces_after_archive_upload() {
    let store = MockArtifactStore::start().await;
    store.fail_history();

    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");
    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(&login, vec![], vec![passing_test(&login, "logs in")])],
        )],
    );

    let result = report_run(&test_config(&store), &run).await;

    assert!(matches!(result, Err(ReporterError::History(_))));
    assert!(store.upload_named(ARCHIVE_NAME).is_some());
}
