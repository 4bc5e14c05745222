use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use glidepath_core_types::{ConsolidatedPortfolio, CorrelationId, StrategyAllocation, Symbol};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::SignalGenerationError;
use crate::evaluator::{MarketDataPort, StrategyEvaluator};

const CONSOLIDATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Drops symbols whose weight is below `dust_threshold`, then rescales the
/// survivors so they sum to exactly 1 (a no-op if nothing was dropped and
/// the input already summed to 1). Returns the pre-rescale sum so callers
/// can judge how much renormalization occurred.
pub fn normalize_weights(weights: &mut BTreeMap<Symbol, Decimal>, dust_threshold: Decimal) -> Decimal {
    weights.retain(|_, weight| *weight >= dust_threshold);
    let sum: Decimal = weights.values().copied().sum();
    if sum > Decimal::ZERO && sum != Decimal::ONE {
        for weight in weights.values_mut() {
            *weight /= sum;
        }
    }
    sum
}

/// One named strategy contributing to the consolidated portfolio, with its
/// allocation share of the total (the `aᵢ` in `Σ aᵢ·wᵢ(s)`).
pub struct WeightedStrategy {
    pub evaluator: Arc<dyn StrategyEvaluator>,
    pub allocation_share: Decimal,
}

/// Evaluates every configured strategy and consolidates the results into a
/// single target portfolio.
#[derive(Debug, Clone, Copy)]
pub struct SignalStage {
    pub dust_threshold: Decimal,
    pub min_strategies_for_partial: usize,
}

impl SignalStage {
    pub fn new(dust_threshold: Decimal, min_strategies_for_partial: usize) -> Self {
        Self {
            dust_threshold,
            min_strategies_for_partial,
        }
    }

    /// Runs every strategy, normalizes each one's weights, and consolidates
    /// them weighted by `allocation_share`. On partial strategy failure,
    /// continues with the survivors provided at least
    /// `min_strategies_for_partial` produced a result, renormalizing the
    /// survivors' allocation shares to sum to 1.
    pub async fn run(
        &self,
        strategies: &[WeightedStrategy],
        market_data: &dyn MarketDataPort,
        as_of: DateTime<Utc>,
        correlation_id: CorrelationId,
    ) -> Result<(ConsolidatedPortfolio, Vec<StrategyAllocation>), SignalGenerationError> {
        let total = strategies.len();
        let mut allocations = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for weighted in strategies {
            match weighted.evaluator.evaluate(market_data, as_of).await {
                Ok(mut weights) => {
                    normalize_weights(&mut weights, self.dust_threshold);
                    allocations.push((
                        weighted.allocation_share,
                        StrategyAllocation {
                            strategy_id: weighted.evaluator.strategy_id().to_string(),
                            correlation_id,
                            timestamp: as_of,
                            schema_version: "1.0".to_string(),
                            weights,
                        },
                    ));
                }
                Err(error) => {
                    warn!(
                        strategy_id = weighted.evaluator.strategy_id(),
                        %error,
                        "strategy evaluation failed"
                    );
                    failures.push(weighted.evaluator.strategy_id().to_string());
                }
            }
        }

        if !failures.is_empty() {
            if allocations.len() < self.min_strategies_for_partial {
                return Err(SignalGenerationError::InsufficientStrategies {
                    failed: failures.len(),
                    total,
                    min_required: self.min_strategies_for_partial,
                });
            }
            info!(failed = ?failures, survivors = allocations.len(), "continuing with partial signal");
        }

        let share_sum: Decimal = allocations.iter().map(|(share, _)| *share).sum();
        let mut consolidated: BTreeMap<Symbol, Decimal> = BTreeMap::new();
        let contributing_strategies: Vec<String> =
            allocations.iter().map(|(_, alloc)| alloc.strategy_id.clone()).collect();

        for (share, allocation) in &allocations {
            let normalized_share = if share_sum > Decimal::ZERO {
                *share / share_sum
            } else {
                Decimal::ZERO
            };
            for (symbol, weight) in &allocation.weights {
                *consolidated.entry(symbol.clone()).or_insert(Decimal::ZERO) += normalized_share * weight;
            }
        }

        let sum: Decimal = consolidated.values().copied().sum();
        if (sum - Decimal::ONE).abs() > CONSOLIDATION_TOLERANCE && sum != Decimal::ZERO {
            return Err(SignalGenerationError::ConsolidationOutOfTolerance { sum });
        }

        let portfolio = ConsolidatedPortfolio {
            correlation_id,
            timestamp: as_of,
            schema_version: "1.0".to_string(),
            contributing_strategies,
            weights: consolidated,
        };

        Ok((portfolio, allocations.into_iter().map(|(_, alloc)| alloc).collect()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use glidepath_broker::Bar;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::DataUnavailableError;

    struct FixedEvaluator {
        id: &'static str,
        weights: BTreeMap<Symbol, Decimal>,
        fails: bool,
    }

    #[async_trait]
    impl StrategyEvaluator for FixedEvaluator {
        fn strategy_id(&self) -> &str {
            self.id
        }

        async fn evaluate(
            &self,
            _market_data: &dyn MarketDataPort,
            _as_of: DateTime<Utc>,
        ) -> Result<BTreeMap<Symbol, Decimal>, DataUnavailableError> {
            if self.fails {
                return Err(DataUnavailableError::Exhausted {
                    symbol: Symbol::parse("AAPL").unwrap(),
                    attempts: 3,
                    reason: "fixture failure".to_string(),
                });
            }
            Ok(self.weights.clone())
        }
    }

    struct NoopMarketData;

    #[async_trait]
    impl MarketDataPort for NoopMarketData {
        async fn bars(&self, _symbol: &Symbol, _lookback: usize) -> Result<Vec<Bar>, DataUnavailableError> {
            Ok(vec![])
        }
    }

    fn weights(pairs: &[(&str, Decimal)]) -> BTreeMap<Symbol, Decimal> {
        pairs
            .iter()
            .map(|(sym, weight)| (Symbol::parse(sym).unwrap(), *weight))
            .collect()
    }

    #[tokio::test]
    async fn consolidates_two_strategies_by_allocation_share() {
        let stage = SignalStage::new(dec!(0.001), 1);
        let strategies = vec![
            WeightedStrategy {
                evaluator: Arc::new(FixedEvaluator {
                    id: "equal_weight",
                    weights: weights(&[("AAPL", dec!(0.5)), ("MSFT", dec!(0.5))]),
                    fails: false,
                }),
                allocation_share: dec!(0.5),
            },
            WeightedStrategy {
                evaluator: Arc::new(FixedEvaluator {
                    id: "momentum",
                    weights: weights(&[("MSFT", dec!(1.0))]),
                    fails: false,
                }),
                allocation_share: dec!(0.5),
            },
        ];

        let (portfolio, allocations) = stage
            .run(&strategies, &NoopMarketData, Utc::now(), CorrelationId::new())
            .await
            .unwrap();

        assert_eq!(allocations.len(), 2);
        assert_eq!(portfolio.weights[&Symbol::parse("AAPL").unwrap()], dec!(0.25));
        assert_eq!(portfolio.weights[&Symbol::parse("MSFT").unwrap()], dec!(0.75));
    }

    #[tokio::test]
    async fn partial_failure_below_minimum_fails_the_whole_signal() {
        let stage = SignalStage::new(dec!(0.001), 2);
        let strategies = vec![
            WeightedStrategy {
                evaluator: Arc::new(FixedEvaluator {
                    id: "ok",
                    weights: weights(&[("AAPL", dec!(1.0))]),
                    fails: false,
                }),
                allocation_share: dec!(0.5),
            },
            WeightedStrategy {
                evaluator: Arc::new(FixedEvaluator {
                    id: "broken",
                    weights: BTreeMap::new(),
                    fails: true,
                }),
                allocation_share: dec!(0.5),
            },
        ];

        let error = stage
            .run(&strategies, &NoopMarketData, Utc::now(), CorrelationId::new())
            .await
            .unwrap_err();
        assert!(matches!(error, SignalGenerationError::InsufficientStrategies { .. }));
    }

    #[test]
    fn normalize_weights_drops_dust_and_rescales_survivors() {
        let mut input = weights(&[("AAPL", dec!(0.98)), ("PENNY", dec!(0.02))]);
        normalize_weights(&mut input, dec!(0.05));
        assert_eq!(input.len(), 1);
        assert_eq!(input[&Symbol::parse("AAPL").unwrap()], dec!(1));
    }
}
