use glidepath_core_types::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteCacheError {
    #[error("no cached quote for {0}")]
    NoQuote(Symbol),

    #[error("quote for {symbol} is {age_ms}ms stale, exceeding the {max_age_ms}ms limit")]
    Stale { symbol: Symbol, age_ms: i64, max_age_ms: i64 },

    #[error(transparent)]
    Broker(#[from] glidepath_broker::BrokerError),
}
