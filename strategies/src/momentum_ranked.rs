use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glidepath_core_types::Symbol;
use glidepath_signal::{DataUnavailableError, MarketDataPort, StrategyEvaluator};
use rust_decimal::Decimal;
use tracing::debug;

/// Ranks a candidate universe by trailing return over `lookback_bars` bars
/// and splits weight evenly across the top `top_n` positive-momentum
/// symbols. Candidates with insufficient history or non-positive momentum
/// are dropped rather than shorted (the system is long-only).
#[derive(Debug, Clone)]
pub struct MomentumRankedStrategy {
    strategy_id: String,
    candidates: Vec<Symbol>,
    lookback_bars: usize,
    top_n: usize,
}

impl MomentumRankedStrategy {
    pub fn new(strategy_id: impl Into<String>, candidates: Vec<Symbol>, lookback_bars: usize, top_n: usize) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            candidates,
            lookback_bars,
            top_n,
        }
    }
}

#[async_trait]
impl StrategyEvaluator for MomentumRankedStrategy {
    fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    async fn evaluate(
        &self,
        market_data: &dyn MarketDataPort,
        _as_of: DateTime<Utc>,
    ) -> Result<BTreeMap<Symbol, Decimal>, DataUnavailableError> {
        let mut ranked = Vec::with_capacity(self.candidates.len());
        for symbol in &self.candidates {
            let bars = market_data.bars(symbol, self.lookback_bars).await?;
            let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
                continue;
            };
            if first.close <= Decimal::ZERO {
                continue;
            }
            let momentum = (last.close - first.close) / first.close;
            debug!(%symbol, %momentum, "computed trailing momentum");
            if momentum > Decimal::ZERO {
                ranked.push((symbol.clone(), momentum));
            }
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.top_n);

        if ranked.is_empty() {
            return Ok(BTreeMap::new());
        }
        let weight = Decimal::ONE / Decimal::from(ranked.len());
        Ok(ranked.into_iter().map(|(symbol, _)| (symbol, weight)).collect())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use glidepath_broker::Bar;
    use rust_decimal_macros::dec;

    use super::*;

    struct FixedBars(BTreeMap<Symbol, Vec<Bar>>);

    #[async_trait]
    impl MarketDataPort for FixedBars {
        async fn bars(&self, symbol: &Symbol, _lookback: usize) -> Result<Vec<Bar>, DataUnavailableError> {
            Ok(self.0.get(symbol).cloned().unwrap_or_default())
        }
    }

    fn bar(close: Decimal) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn ranks_by_trailing_return_and_keeps_only_top_n() {
        let aapl = Symbol::parse("AAPL").unwrap();
        let msft = Symbol::parse("MSFT").unwrap();
        let flat = Symbol::parse("FLAT").unwrap();

        let mut fixtures = BTreeMap::new();
        fixtures.insert(aapl.clone(), vec![bar(dec!(100)), bar(dec!(120))]); // +20%
        fixtures.insert(msft.clone(), vec![bar(dec!(100)), bar(dec!(105))]); // +5%
        fixtures.insert(flat.clone(), vec![bar(dec!(100)), bar(dec!(100))]); // 0%, dropped

        let strategy =
            MomentumRankedStrategy::new("momentum", vec![aapl.clone(), msft.clone(), flat], 2, 1);
        let weights = strategy
            .evaluate(&FixedBars(fixtures), Utc::now())
            .await
            .unwrap();

        assert_eq!(weights.len(), 1);
        assert_eq!(weights[&aapl], dec!(1));
    }

    #[tokio::test]
    async fn no_positive_momentum_yields_empty_weights() {
        let aapl = Symbol::parse("AAPL").unwrap();
        let mut fixtures = BTreeMap::new();
        fixtures.insert(aapl.clone(), vec![bar(dec!(100)), bar(dec!(90))]);

        let strategy = MomentumRankedStrategy::new("momentum", vec![aapl], 2, 1);
        let weights = strategy.evaluate(&FixedBars(fixtures), Utc::now()).await.unwrap();
        assert!(weights.is_empty());
    }
}
