//! The [`ExecutionError`] taxonomy and its mapping onto the retry policy
//! the per-trade pipeline applies.

use glidepath_core_types::{OrderId, Symbol};
use glidepath_risk::GatingError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Gating(#[from] GatingError),

    #[error(transparent)]
    RunState(#[from] glidepath_runstate::RunStateError),

    #[error("no usable quote for {symbol}: {source}")]
    QuoteUnavailable {
        symbol: Symbol,
        #[source]
        source: glidepath_quotes::QuoteCacheError,
    },

    #[error(transparent)]
    Broker(#[from] glidepath_broker::BrokerError),

    #[error("{symbol}: order {order_id} did not reach a terminal state within its timeout")]
    ExecutionTimeout { symbol: Symbol, order_id: OrderId },

    #[error("{symbol}: persistent partial fill, {filled} of {requested} shares after exhausting re-pegs")]
    PersistentFillFailure {
        symbol: Symbol,
        filled: Decimal,
        requested: Decimal,
    },

    #[error("{symbol}: computed order size rounds to zero shares at price {price}")]
    ZeroQuantity { symbol: Symbol, price: Decimal },
}

impl ExecutionError {
    /// Whether the failure taxonomy calls for retrying the whole trade
    /// rather than marking it FAILED outright. Invalid-symbol/malformed
    /// orders, daily-limit breaches, and persistent fill failures are all
    /// terminal; transient broker errors, rate limits, and a run-state CAS
    /// conflict are the retryable subset.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutionError::Broker(inner) => inner.is_transient(),
            ExecutionError::RunState(glidepath_runstate::RunStateError::CasConflict(_)) => true,
            _ => false,
        }
    }

    /// `true` for the subset the retry table marks "retry, then FAILED
    /// without halting the run", as opposed to gating failures, which are
    /// never retried at all.
    pub fn is_broker_transient(&self) -> bool {
        matches!(self, ExecutionError::Broker(inner) if inner.is_transient())
    }
}
