//! Report building against the mock artifact store.

use summary_reporter::error::ReporterError;
use summary_reporter::models::Outcome;
use summary_reporter::services::identity;

use super::mock_artifact_store::{ARCHIVE_NAME, MockArtifactStore};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_archive_holds_file_documents_and_manifest() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");
    let cart = ws.write_source("tests/shop/cart.spec.ts");

    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![
                file_suite(&login, vec![], vec![passing_test(&login, "logs in")]),
                file_suite(
                    &cart,
                    vec![],
                    vec![passing_test(&cart, "adds"), failing_test(&cart, "removes")],
                ),
            ],
        )],
    );

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();
    assert!(!build.ok);

    let archive = store.upload_named(ARCHIVE_NAME).expect("archive not uploaded");
    assert_eq!(archive.run_name, RUN_NAME);
    assert_eq!(archive.environment, ENVIRONMENT);

    let login_id = identity::file_id("login.spec.ts");
    let cart_id = identity::file_id("shop/cart.spec.ts");
    let entries = read_archive(&archive.data);
    assert_eq!(entries.len(), 3);
    assert!(entries.contains_key(&format!("{}.json", login_id)));
    assert!(entries.contains_key(&format!("{}.json", cart_id)));

    let manifest = &entries["report.json"];
    assert_eq!(manifest["runName"], RUN_NAME);
    assert_eq!(manifest["env"], ENVIRONMENT);
    assert_eq!(manifest["stats"]["total"], 3);
    assert_eq!(manifest["stats"]["unexpected"], 1);
    assert_eq!(manifest["stats"]["ok"], false);
    assert_eq!(manifest["projectNames"][0], "chromium");
    assert_eq!(manifest["metadata"]["ci"], true);

    // Failing file first, failing test first within it
    assert_eq!(manifest["files"][0]["fileId"], cart_id.as_str());
    assert_eq!(manifest["files"][0]["fileName"], "tests/shop/cart.spec.ts");
    assert_eq!(manifest["files"][0]["tests"][0]["title"], "removes");
    assert_eq!(manifest["files"][1]["fileId"], login_id.as_str());

    // Full documents keep traversal order
    let cart_doc = &entries[&format!("{}.json", cart_id)];
    assert_eq!(cart_doc["tests"][0]["title"], "adds");
    assert_eq!(cart_doc["tests"][1]["title"], "removes");
}

#[actix_rt::test]
async fn test_ids_are_stable_across_builds() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let make_run = || {
        run_input(
            &ws,
            vec![project(
                "chromium",
                &ws.test_dir(),
                vec![file_suite(
                    &login,
                    vec![describe("auth", vec![], vec![passing_test(&login, "logs in")])],
                    vec![passing_test(&login, "loads")],
                )],
            )],
        )
    };

    let (first_builder, _) = test_builder(&store);
    let first = first_builder.build(&make_run()).await.unwrap();
    let (second_builder, _) = test_builder(&store);
    let second = second_builder.build(&make_run()).await.unwrap();

    let ids = |build: &summary_reporter::services::BuildResult| {
        build.report.files[0]
            .tests
            .iter()
            .map(|t| t.test_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));

    let file_id = identity::file_id("login.spec.ts");
    let tests = &first.report.files[0].tests;
    assert_eq!(tests.len(), 2);
    for test in tests {
        assert!(test.test_id.starts_with(&format!("{}-", file_id)));
        assert_eq!(test.test_id.len(), 2 * identity::ID_LENGTH + 1);
    }
    assert_ne!(tests[0].test_id, tests[1].test_id);

    // Nested describe comes first and carries its title path
    assert_eq!(tests[0].title, "logs in");
    assert_eq!(tests[0].path, vec!["auth".to_string()]);
    assert!(tests[1].path.is_empty());
}

#[actix_rt::test]
async fn test_same_file_under_two_projects_shares_a_group() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let run = run_input(
        &ws,
        vec![
            project(
                "chromium",
                &ws.test_dir(),
                vec![file_suite(&login, vec![], vec![passing_test(&login, "logs in")])],
            ),
            project(
                "firefox",
                &ws.test_dir(),
                vec![file_suite(&login, vec![], vec![passing_test(&login, "logs in")])],
            ),
        ],
    );

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();

    assert_eq!(build.report.files.len(), 1);
    let tests = &build.report.files[0].tests;
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0].project_name, "chromium");
    assert_eq!(tests[1].project_name, "firefox");
    assert_ne!(tests[0].test_id, tests[1].test_id);
    assert_eq!(build.report.project_names, vec!["chromium", "firefox"]);
    assert_eq!(build.single_test_id, None);
}

#[actix_rt::test]
async fn test_steps_are_deduplicated_and_get_snippets() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let mut steps: Vec<_> = (0..5).map(|_| step(&login, "click", 5, 4)).collect();
    steps.push(step(&login, "fill", 1, 2));
    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![test(&login, "logs in", 3, vec![result("passed", steps, vec![])])],
            )],
        )],
    );

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();
    assert!(build.warnings.is_empty());

    let archive = store.upload_named(ARCHIVE_NAME).unwrap();
    let entries = read_archive(&archive.data);
    let doc = &entries[&format!("{}.json", identity::file_id("login.spec.ts"))];
    let steps = doc["tests"][0]["results"][0]["steps"].as_array().unwrap();

    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["title"], "click");
    assert_eq!(steps[0]["count"], 5);
    assert_eq!(steps[0]["duration"], 20);
    assert_eq!(steps[0]["location"]["file"], "tests/login.spec.ts");
    assert_eq!(
        steps[0]["snippet"],
        "   4 | line 4\n   5 | line 5\n     |   ^\n   6 | line 6"
    );

    assert_eq!(steps[1]["count"], 1);
    assert!(steps[1].get("snippet").is_none());
}

#[actix_rt::test]
async fn test_unreadable_snippet_source_is_a_warning() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.test_dir().join("login.spec.ts");

    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![test(
                    &login,
                    "logs in",
                    3,
                    vec![result("passed", vec![step(&login, "click", 5, 1)], vec![])],
                )],
            )],
        )],
    );

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();

    assert_eq!(build.warnings.len(), 1);
    assert!(store.upload_named(ARCHIVE_NAME).is_some());
}

#[actix_rt::test]
async fn test_single_test_id_only_for_one_test() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let single = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(&login, vec![], vec![passing_test(&login, "logs in")])],
        )],
    );
    let (builder, _) = test_builder(&store);
    let build = builder.build(&single).await.unwrap();
    assert!(build.ok);
    assert_eq!(
        build.single_test_id.as_deref(),
        Some(build.report.files[0].tests[0].test_id.as_str())
    );

    let two = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![passing_test(&login, "logs in"), passing_test(&login, "logs out")],
            )],
        )],
    );
    let (builder, _) = test_builder(&store);
    let build = builder.build(&two).await.unwrap();
    assert_eq!(build.single_test_id, None);
}

#[actix_rt::test]
async fn test_retried_test_is_flaky_and_ok() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![test(
                    &login,
                    "logs in",
                    3,
                    vec![result("failed", vec![], vec![]), result("passed", vec![], vec![])],
                )],
            )],
        )],
    );

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();

    let test = &build.report.files[0].tests[0];
    assert_eq!(test.outcome, Outcome::Flaky);
    assert!(test.ok);
    assert_eq!(test.duration, 50);
    assert_eq!(build.report.stats.flaky, 1);
    assert!(!build.ok);
}

#[actix_rt::test]
async fn test_file_suite_without_location_aborts() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    let login = ws.write_source("tests/login.spec.ts");

    let run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![describe("login.spec.ts", vec![], vec![passing_test(&login, "logs in")])],
        )],
    );

    let (builder, _) = test_builder(&store);
    let result = builder.build(&run).await;

    assert!(matches!(result, Err(ReporterError::InvalidInput(_))));
    assert!(store.uploads().is_empty());
}

#[actix_rt::test]
async fn test_dotted_path_spellings_resolve_to_the_same_file() {
    let store = MockArtifactStore::start().await;
    let ws = Workspace::new();
    ws.write_source("tests/login.spec.ts");
    let login = ws.root().join("tests/unit/../login.spec.ts");

    let mut run = run_input(
        &ws,
        vec![project(
            "chromium",
            &ws.test_dir(),
            vec![file_suite(
                &login,
                vec![],
                vec![test(
                    &login,
                    "logs in",
                    3,
                    vec![result("passed", vec![step(&login, "click", 5, 1)], vec![])],
                )],
            )],
        )],
    );
    run.root_dir = ws.root().join("tests/./..");
    run.projects[0].test_dir = ws.root().join("tests/../tests");

    let (builder, _) = test_builder(&store);
    let build = builder.build(&run).await.unwrap();
    assert!(build.warnings.is_empty(), "{:?}", build.warnings);

    let file = &build.report.files[0];
    assert_eq!(file.file_id, identity::file_id("login.spec.ts"));
    assert_eq!(file.file_name, "tests/login.spec.ts");

    let archive = store.upload_named(ARCHIVE_NAME).unwrap();
    let entries = read_archive(&archive.data);
    let doc = &entries[&format!("{}.json", file.file_id)];
    let step = &doc["tests"][0]["results"][0]["steps"][0];
    assert_eq!(step["location"]["file"], "tests/login.spec.ts");
    assert_eq!(
        step["snippet"],
        "   4 | line 4\n   5 | line 5\n     |   ^\n   6 | line 6"
    );
}
