use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glidepath_core_types::Symbol;
use glidepath_signal::{DataUnavailableError, MarketDataPort, StrategyEvaluator};
use rust_decimal::Decimal;

/// Splits weight evenly across a fixed symbol list. No market data is
/// consulted; this is the simplest possible fixture for the consolidation
/// algorithm and for the CLI's paper mode.
#[derive(Debug, Clone)]
pub struct EqualWeightStrategy {
    strategy_id: String,
    symbols: Vec<Symbol>,
}

impl EqualWeightStrategy {
    pub fn new(strategy_id: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            symbols,
        }
    }
}

#[async_trait]
impl StrategyEvaluator for EqualWeightStrategy {
    fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    async fn evaluate(
        &self,
        _market_data: &dyn MarketDataPort,
        _as_of: DateTime<Utc>,
    ) -> Result<BTreeMap<Symbol, Decimal>, DataUnavailableError> {
        if self.symbols.is_empty() {
            return Ok(BTreeMap::new());
        }
        let weight = Decimal::ONE / Decimal::from(self.symbols.len());
        Ok(self.symbols.iter().cloned().map(|symbol| (symbol, weight)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use glidepath_broker::Bar;

    struct NoopMarketData;

    #[async_trait]
    impl MarketDataPort for NoopMarketData {
        async fn bars(&self, _symbol: &Symbol, _lookback: usize) -> Result<Vec<Bar>, DataUnavailableError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn splits_weight_evenly_across_symbols() {
        let strategy = EqualWeightStrategy::new(
            "equal_weight",
            vec![Symbol::parse("AAPL").unwrap(), Symbol::parse("MSFT").unwrap()],
        );
        let weights = strategy.evaluate(&NoopMarketData, Utc::now()).await.unwrap();
        assert_eq!(weights[&Symbol::parse("AAPL").unwrap()], dec!(0.5));
        assert_eq!(weights[&Symbol::parse("MSFT").unwrap()], dec!(0.5));
    }

    #[tokio::test]
    async fn empty_symbol_list_yields_empty_weights() {
        let strategy = EqualWeightStrategy::new("equal_weight", vec![]);
        let weights = strategy.evaluate(&NoopMarketData, Utc::now()).await.unwrap();
        assert!(weights.is_empty());
    }
}
