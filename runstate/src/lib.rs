#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Run-State Store
//!
//! The durable record of each run's expected trades, per-trade status,
//! cumulative daily traded value, and the one-shot completion flag.
//! Consulted by every Execution invocation: it is what makes sharded
//! execution across stateless workers safe, and what the idempotency
//! check and the daily-limit gate are built on.
//!
//! [`store::InMemoryRunStateStore`] is a real, concurrency-correct
//! implementation suitable for a single-process deployment (the
//! single-writer-process assumption this implies is documented on the
//! type itself); a distributed backing store (DynamoDB, Postgres, ...)
//! would implement the same [`store::RunStateStore`] trait.

pub mod error;
pub mod ledger;
pub mod store;

pub use error::RunStateError;
pub use ledger::{LedgerSink, InMemoryLedgerSink};
pub use store::{InMemoryRunStateStore, RunStateStore};
