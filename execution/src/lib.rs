#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Execution
//!
//! The Execution Stage: pre-trade gating orchestration, the smart-limit
//! order pipeline (quote acquisition, sizing, pegged limit submission,
//! bounded re-pegging, market fallback), run-state completion, and the
//! batched-mode settlement barrier between a run's SELL and BUY phases.
//!
//! This crate owns no state of its own; every mutation lands in
//! [`glidepath_runstate::RunStateStore`] or the broker; [`TradeExecutor`]
//! is a stateless orchestrator over those seams, safe to run one per
//! trade concurrently across a run.

pub mod error;
pub mod executor;
pub mod params;
pub mod pricing;
pub mod settlement;

pub use error::ExecutionError;
pub use executor::{ExecutionOutcome, TradeExecutor};
pub use params::ExecutionParams;
pub use settlement::SettlementWaiter;
