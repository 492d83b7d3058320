//! Integration test suite.
//!
//! Builds reports end to end against an in-process mock artifact store.
//!
//! Run with: cargo test --test integration

mod test_helpers;

mod build_tests;
mod history_tests;
