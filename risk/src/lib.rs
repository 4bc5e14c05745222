#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Risk
//!
//! Pre-trade gating: the policy checks run for every trade before an
//! order reaches the broker. Covers structural validation, the
//! `MAX_SINGLE_ORDER_USD` order-size gate, the daily cumulative-value
//! gate, and the market-hours check, steps 2 through 4 of the pre-trade
//! gating sequence. The idempotency check (step 1) and the state
//! transition (step 5) operate on the run record and live in
//! `glidepath-runstate`; this crate is stateless.

pub mod check;
pub mod result;

pub use check::{
    daily_limit_check, market_hours_check, order_size_check, structural_validation_check, GatingError,
    GatingLimits,
};
pub use result::{RiskApproved, RiskRefused};
