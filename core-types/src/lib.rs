#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Core Types
//!
//! Shared identifiers, the decimal-safe portfolio/trade data model, and the
//! cross-cutting error context used by every other `glidepath` crate.
//!
//! Nothing in this crate talks to the network, a clock, or a broker, it is
//! the vocabulary the rest of the workspace is written in. Monetary and
//! weight quantities are always [`rust_decimal::Decimal`]; this crate never
//! exposes an `f64` for money or weights.

pub mod error;
pub mod ids;
pub mod plan;
pub mod run;
pub mod signal;
pub mod symbol;
pub mod trade;

pub use error::ErrorContext;
pub use ids::{CausationId, CorrelationId, OrderId, PlanId, RunId, TradeId};
pub use plan::{PlanInvariantViolation, Priority, RebalancePlan, RebalancePlanItem, TradeAction};
pub use run::{ExecutionRunRecord, PerTradeStatus, RunStatus, TradeDescriptor, TradeLedgerEntry, TradeStatus};
pub use signal::{ConsolidatedPortfolio, StrategyAllocation};
pub use symbol::Symbol;
pub use trade::{ExecutedOrder, OrderStatus, Phase, Quote, SubmissionStrategy, TradeMessage};
