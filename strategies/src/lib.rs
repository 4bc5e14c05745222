#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Example [`glidepath_signal::StrategyEvaluator`] implementations. Fixtures
//! for tests and the CLI's paper mode, not a strategy DSL engine (that
//! evaluator is external per the out-of-scope collaborators).

pub mod equal_weight;
pub mod momentum_ranked;

pub use equal_weight::EqualWeightStrategy;
pub use momentum_ranked::MomentumRankedStrategy;
