#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Portfolio Stage
//!
//! Consolidates target weights with the live account snapshot into a
//! [`glidepath_core_types::RebalancePlan`], and, in sharded mode, lifts
//! every non-HOLD item into its own [`glidepath_core_types::TradeMessage`]
//! plus an initialized run record.

pub mod error;
pub mod limits;
pub mod stage;

pub use error::{InsufficientDataError, PlanningError};
pub use limits::PortfolioLimits;
pub use stage::{AccountSnapshot, PortfolioStage, PortfolioStageOutput};
