//! Human-readable error text for attempts and top-level errors.

use crate::models::TestStatus;
use crate::models::input::{ResultNode, TestError};

/// Prefix of a stack frame line.
const STACK_FRAME_PREFIX: &str = "    at ";

/// Strip terminal control sequences.
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// Format one runner error.
///
/// The headline is the part of the stack above the first frame, falling back
/// to `message` and then `value`. The error's own snippet and the stack frames
/// follow, each after a blank line.
pub fn format_error(error: &TestError) -> String {
    let message = error
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .or(error.value.as_deref())
        .unwrap_or_default();

    if error.stack.is_none() && error.location.is_none() {
        return message.to_string();
    }

    let (headline, frames) = match error.stack.as_deref() {
        Some(stack) => split_stack(stack),
        None => (String::new(), Vec::new()),
    };

    let mut tokens = vec![if headline.is_empty() {
        message.to_string()
    } else {
        headline
    }];

    if let Some(snippet) = &error.snippet {
        tokens.push(String::new());
        tokens.push(strip_ansi(snippet));
    }

    if !frames.is_empty() {
        tokens.push(String::new());
        tokens.push(frames.join("\n"));
    }

    tokens.join("\n")
}

fn split_stack(stack: &str) -> (String, Vec<&str>) {
    let lines: Vec<&str> = stack.split('\n').collect();
    let first_frame = lines
        .iter()
        .position(|line| line.starts_with(STACK_FRAME_PREFIX))
        .unwrap_or(lines.len());
    (lines[..first_frame].join("\n"), lines[first_frame..].to_vec())
}

/// All error messages of one attempt, in display order.
pub fn format_result_failure(expected_status: TestStatus, result: &ResultNode) -> Vec<String> {
    let mut errors = Vec::new();

    if result.status == TestStatus::Passed && expected_status == TestStatus::Failed {
        errors.push("Expected to fail, but passed.".to_string());
    }
    if result.status == TestStatus::Interrupted {
        errors.push("Test was interrupted.".to_string());
    }

    errors.extend(result.errors.iter().map(format_error));
    errors
}
