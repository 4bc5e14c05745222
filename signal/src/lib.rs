#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Signal Stage
//!
//! For each configured strategy, invokes its pure evaluation function (the
//! strategy DSL engine itself is external, per the out-of-scope
//! collaborators), normalizes and dust-filters the resulting weights, then
//! consolidates the per-strategy vectors into one target portfolio.
//!
//! Core abstractions only: [`StrategyEvaluator`] and [`MarketDataPort`] are
//! traits implemented by `glidepath-strategies` and by a broker adapter
//! respectively, keeping the abstraction separate from any one
//! implementation of it.

pub mod error;
pub mod evaluator;
pub mod stage;

pub use error::{DataUnavailableError, SignalGenerationError};
pub use evaluator::{MarketDataPort, StrategyEvaluator};
pub use stage::{normalize_weights, SignalStage};
