//! brandpulse — bounded-concurrency prompt-run orchestrator.
//!
//! Runs a list of prompt jobs against a rate-limited generation service,
//! classifies each answer for brand mentions and persists the outcomes
//! into a spreadsheet-style grid whose daily columns grow on demand.
//! Writes are buffered and flushed in batches; every remote call goes
//! through a retry-with-backoff executor; job failures are isolated so a
//! run always drains and reports.

pub mod analysis;
pub mod buffer;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod retry;
pub mod run;
pub mod scheduler;
pub mod schema;
pub mod sheets;
pub mod source;
pub mod ui;
pub mod urls;
