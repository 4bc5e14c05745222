//! Per-strategy attribution rollups.
//!
//! A [`TradeLedgerEntry`] can name more than one contributing strategy
//! (`strategy_attribution`), since the portfolio stage consolidates
//! target weights across every strategy feeding a run before producing
//! one trade per symbol. Each named strategy is credited with the row's
//! full filled value, this double-counts traded value across the run
//! total when a trade is jointly attributed, by design: the question a
//! breakdown answers is "how much did this strategy drive", not "how do
//! these rows partition".

use glidepath_core_types::{TradeLedgerEntry, TradeStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metric::SuccessRate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBreakdown {
    pub strategy: String,
    pub trades: usize,
    pub completed: usize,
    pub failed: usize,
    pub success_rate: Option<SuccessRate>,
    pub total_filled_value: Decimal,
}

pub fn breakdown_by_strategy(entries: &[TradeLedgerEntry]) -> Vec<StrategyBreakdown> {
    let mut by_strategy: BTreeMap<String, (usize, usize, usize, Decimal)> = BTreeMap::new();

    for entry in entries {
        let filled_value = entry.average_fill_price.map(|price| entry.filled_quantity * price).unwrap_or(Decimal::ZERO);
        for strategy in &entry.strategy_attribution {
            let stats = by_strategy.entry(strategy.clone()).or_insert((0, 0, 0, Decimal::ZERO));
            stats.0 += 1;
            match entry.status {
                TradeStatus::Completed => stats.1 += 1,
                TradeStatus::Failed => stats.2 += 1,
                TradeStatus::Pending | TradeStatus::Running => {}
            }
            stats.3 += filled_value;
        }
    }

    by_strategy
        .into_iter()
        .map(|(strategy, (trades, completed, failed, total_filled_value))| StrategyBreakdown {
            strategy,
            trades,
            completed,
            failed,
            success_rate: SuccessRate::calculate(Decimal::from(completed), Decimal::from(completed + failed)),
            total_filled_value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glidepath_core_types::{CorrelationId, RunId, Symbol, TradeAction, TradeId};
    use rust_decimal_macros::dec;

    #[test]
    fn a_jointly_attributed_trade_credits_every_named_strategy() {
        let now = Utc::now();
        let entry = TradeLedgerEntry {
            trade_id: TradeId::new(),
            run_id: RunId::new(),
            correlation_id: CorrelationId::new(),
            symbol: Symbol::parse("AAPL").unwrap(),
            side: TradeAction::Buy,
            requested_quantity: dec!(10),
            filled_quantity: dec!(10),
            average_fill_price: Some(dec!(100)),
            status: TradeStatus::Completed,
            strategy_attribution: vec!["equal_weight".to_string(), "momentum".to_string()],
            created_at: now,
            completed_at: Some(now),
        };
        let breakdown = breakdown_by_strategy(&[entry]);
        assert_eq!(breakdown.len(), 2);
        assert!(breakdown.iter().all(|b| b.total_filled_value == dec!(1000) && b.completed == 1));
    }
}
