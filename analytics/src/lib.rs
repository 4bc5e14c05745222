#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Analytics
//!
//! Reporting over the append-only trade ledger: per-run and per-strategy
//! summaries, and the plain-text rendering the CLI `status` command
//! prints. No email or PDF generation, and no scheduling of anything;
//! both are out of scope for this system. This crate only turns
//! [`TradeLedgerEntry`] rows a caller already fetched into a summary.
//!
//! [`TradeLedgerEntry`]: glidepath_core_types::TradeLedgerEntry

pub mod metric;
pub mod report;
pub mod summary;

pub use metric::SuccessRate;
pub use report::render_run_summary;
pub use summary::{run_summary, RunSummary, StrategyBreakdown};
