//! Stateless, decimal-exact statistics over a set of [`TradeLedgerEntry`]
//! rows.
//!
//! [`TradeLedgerEntry`]: glidepath_core_types::TradeLedgerEntry

pub mod success_rate;

pub use success_rate::SuccessRate;
