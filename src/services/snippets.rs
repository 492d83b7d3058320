//! Source excerpts for steps.

use futures_util::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

use crate::models::{BuildWarning, TestFile, TestStep, WarningSink};
use crate::services::identity::normalize_path;

/// Render a code frame around `line`, with a caret under `column`.
///
/// The frame holds the line above, the line itself, the caret and the line
/// below. Returns `None` when there is no line above or no line below.
pub fn render_snippet(source: &str, line: u32, column: u32) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let line = line as usize;
    // No trailing marker line: the window needs a real line below.
    if line < 2 || line >= lines.len() {
        return None;
    }

    let width = lines.len().to_string().len();
    let numbered = |n: usize| {
        let text = lines[n - 1];
        if text.is_empty() {
            format!("  {:>width$} |", n)
        } else {
            format!("  {:>width$} | {}", n, text)
        }
    };
    let caret = format!(
        "  {} | {}^",
        " ".repeat(width),
        " ".repeat(column.saturating_sub(1) as usize)
    );

    Some([numbered(line - 1), numbered(line), caret, numbered(line + 1)].join("\n"))
}

/// Fill in `snippet` on every located step.
///
/// Each referenced source file is read once, concurrently, from its
/// normalized absolute location under `root_dir`. Unreadable files are
/// skipped with a warning.
pub async fn attach_snippets(root_dir: &Path, files: &mut [TestFile], warnings: &WarningSink) {
    let mut sources = BTreeSet::new();
    for step in files
        .iter()
        .flat_map(|file| &file.tests)
        .flat_map(|test| &test.results)
        .flat_map(|result| &result.steps)
    {
        step.walk(&mut |step: &TestStep| {
            if let Some(location) = &step.location {
                sources.insert(location.file.clone());
            }
        });
    }

    let root_dir = &normalize_path(root_dir);
    let reads = sources.into_iter().map(move |file| async move {
        let content = tokio::fs::read_to_string(normalize_path(&root_dir.join(&file))).await;
        (file, content)
    });

    let mut contents = HashMap::new();
    for (file, content) in join_all(reads).await {
        match content {
            Ok(content) => {
                contents.insert(file, content);
            }
            Err(e) => warnings.push(BuildWarning::SnippetSourceUnreadable {
                file,
                reason: e.to_string(),
            }),
        }
    }
    debug!("Read {} source files for snippets", contents.len());

    for step in files
        .iter_mut()
        .flat_map(|file| &mut file.tests)
        .flat_map(|test| &mut test.results)
        .flat_map(|result| &mut result.steps)
    {
        step.walk_mut(&mut |step| {
            let Some(location) = &step.location else {
                return;
            };
            if let Some(source) = contents.get(&location.file) {
                step.snippet = render_snippet(source, location.line, location.column);
            }
        });
    }
}
