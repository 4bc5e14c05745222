use thiserror::Error;

/// Errors raised by a [`crate::BrokerClient`] implementation. Maps onto the
/// transient/permanent split the Execution Stage's retry table keys off.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("transient broker error (retryable): {0}")]
    Transient(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("permanent broker error: {0}")]
    Permanent(String),

    #[error("unknown order id: {0}")]
    UnknownOrder(glidepath_core_types::OrderId),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(glidepath_core_types::Symbol),

    #[error("broker call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("trade-update stream disconnected")]
    StreamDisconnected,
}

impl BrokerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::Transient(_) | BrokerError::RateLimited { .. } | BrokerError::Timeout(_))
    }
}
