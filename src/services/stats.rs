//! Outcome tallies and presentation order.

use crate::models::{Stats, TestCaseSummary, TestFileSummary};

/// Tally the outcomes of a file's tests.
pub fn file_stats(tests: &[TestCaseSummary]) -> Stats {
    let mut stats = Stats::default();
    for test in tests {
        stats.record(test.outcome);
    }
    stats
}

/// Element-wise sum over all files.
pub fn total_stats(files: &[TestFileSummary]) -> Stats {
    files.iter().fold(Stats::default(), |mut total, file| {
        total.add(&file.stats);
        total
    })
}

/// Failing tests first, then flaky ones; traversal order otherwise.
pub fn sort_tests(tests: &mut [TestCaseSummary]) {
    tests.sort_by_key(|t| std::cmp::Reverse(t.outcome.weight()));
}

/// Files with failures first, then files with flaky tests.
pub fn sort_files(files: &mut [TestFileSummary]) {
    files.sort_by_key(|f| std::cmp::Reverse(f.stats.weight()));
}
