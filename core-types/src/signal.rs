//! The Signal Stage's output types: per-strategy allocations and their
//! weighted consolidation into one desired portfolio.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::CorrelationId;
use crate::symbol::Symbol;

/// Tolerance within which a set of weights is considered to sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: &str = "0.01";

/// A mapping *symbol → weight* produced by one strategy's evaluation.
///
/// Weights lie in `[0, 1]` and sum to `1.0 ± 0.01`; symbols are normalized
/// and duplicate-free by construction (`Symbol` is already normalized, and
/// this type stores weights in a `BTreeMap` which cannot hold duplicate
/// keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAllocation {
    pub strategy_id: String,
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,
    pub schema_version: String,
    pub weights: BTreeMap<Symbol, Decimal>,
}

impl StrategyAllocation {
    pub fn weight_sum(&self) -> Decimal {
        self.weights.values().sum()
    }
}

/// The weighted merge of one or more [`StrategyAllocation`]s, ready to be
/// handed to the Portfolio Stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedPortfolio {
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,
    pub schema_version: String,
    pub contributing_strategies: Vec<String>,
    pub weights: BTreeMap<Symbol, Decimal>,
}

impl ConsolidatedPortfolio {
    pub fn weight_sum(&self) -> Decimal {
        self.weights.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[test]
    fn weight_sum_adds_all_entries() {
        let allocation = StrategyAllocation {
            strategy_id: "equal-weight".into(),
            correlation_id: CorrelationId::new(),
            timestamp: Utc::now(),
            schema_version: "1.0".into(),
            weights: BTreeMap::from([(symbol("AAPL"), dec!(0.5)), (symbol("MSFT"), dec!(0.5))]),
        };
        assert_eq!(allocation.weight_sum(), dec!(1.0));
    }
}
