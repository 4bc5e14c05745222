use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glidepath_broker::Bar;
use glidepath_core_types::Symbol;
use rust_decimal::Decimal;

use crate::error::DataUnavailableError;

/// The read-only market-data surface a [`StrategyEvaluator`] is given.
/// Narrower than the full broker capability surface: a strategy needs
/// historical bars to compute indicators, nothing else.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn bars(&self, symbol: &Symbol, lookback: usize) -> Result<Vec<Bar>, DataUnavailableError>;
}

/// A declarative strategy's pure evaluation function: market data plus a
/// resolution timestamp in, a target-weight vector out. The DSL engine
/// that would normally produce these weights is external to this crate;
/// `glidepath-strategies` ships example evaluators that implement this
/// trait directly in Rust, as fixtures for tests and the CLI's paper mode.
#[async_trait]
pub trait StrategyEvaluator: Send + Sync {
    fn strategy_id(&self) -> &str;

    async fn evaluate(
        &self,
        market_data: &dyn MarketDataPort,
        as_of: DateTime<Utc>,
    ) -> Result<BTreeMap<Symbol, Decimal>, DataUnavailableError>;
}
