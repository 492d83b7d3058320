//! Test run summary reporter library.
//!
//! Turns the result tree of a finished test run into a content-addressed
//! report archive, uploads it to the artifact store and forwards per-test
//! history rows.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
