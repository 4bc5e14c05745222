//! Per-run rollups over the trade ledger.

pub mod strategy;

pub use strategy::StrategyBreakdown;

use chrono::{DateTime, Utc};
use glidepath_core_types::{RunId, TradeLedgerEntry, TradeStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metric::SuccessRate;

/// Aggregate counts and traded value for every ledger row belonging to one
/// run. Built from whatever a `LedgerSink::entries_for_run` call returns, so
/// it reflects a run's state at the moment of the query; callers re-derive
/// it rather than this crate subscribing to anything live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub total_trades: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_flight: usize,
    pub success_rate: Option<SuccessRate>,
    pub total_filled_value: Decimal,
    pub earliest_created_at: DateTime<Utc>,
    pub latest_completed_at: Option<DateTime<Utc>>,
    pub by_strategy: Vec<StrategyBreakdown>,
}

/// Builds a [`RunSummary`] from a run's ledger rows. Returns `None` for an
/// empty slice, there's nothing to summarize for a run with no attempted
/// trades.
pub fn run_summary(entries: &[TradeLedgerEntry]) -> Option<RunSummary> {
    let run_id = entries.first()?.run_id;

    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut in_flight = 0usize;
    let mut total_filled_value = Decimal::ZERO;
    let mut earliest_created_at = entries[0].created_at;
    let mut latest_completed_at: Option<DateTime<Utc>> = None;

    for entry in entries {
        match entry.status {
            TradeStatus::Completed => completed += 1,
            TradeStatus::Failed => failed += 1,
            TradeStatus::Pending | TradeStatus::Running => in_flight += 1,
        }
        if let Some(price) = entry.average_fill_price {
            total_filled_value += entry.filled_quantity * price;
        }
        if entry.created_at < earliest_created_at {
            earliest_created_at = entry.created_at;
        }
        if let Some(completed_at) = entry.completed_at {
            latest_completed_at = Some(latest_completed_at.map_or(completed_at, |latest| latest.max(completed_at)));
        }
    }

    let terminal = Decimal::from(completed + failed);
    let success_rate = SuccessRate::calculate(Decimal::from(completed), terminal);

    Some(RunSummary {
        run_id,
        total_trades: entries.len(),
        completed,
        failed,
        in_flight,
        success_rate,
        total_filled_value,
        earliest_created_at,
        latest_completed_at,
        by_strategy: strategy::breakdown_by_strategy(entries),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core_types::{CorrelationId, Symbol, TradeAction, TradeId};
    use rust_decimal_macros::dec;

    fn entry(run_id: RunId, status: TradeStatus, filled: Decimal, price: Option<Decimal>) -> TradeLedgerEntry {
        let now = Utc::now();
        TradeLedgerEntry {
            trade_id: TradeId::new(),
            run_id,
            correlation_id: CorrelationId::new(),
            symbol: Symbol::parse("AAPL").unwrap(),
            side: TradeAction::Buy,
            requested_quantity: dec!(10),
            filled_quantity: filled,
            average_fill_price: price,
            status,
            strategy_attribution: vec!["equal_weight".to_string()],
            created_at: now,
            completed_at: matches!(status, TradeStatus::Completed | TradeStatus::Failed).then_some(now),
        }
    }

    #[test]
    fn empty_ledger_has_no_summary() {
        assert!(run_summary(&[]).is_none());
    }

    #[test]
    fn counts_and_traded_value_aggregate_across_rows() {
        let run_id = RunId::new();
        let entries = vec![
            entry(run_id, TradeStatus::Completed, dec!(10), Some(dec!(100))),
            entry(run_id, TradeStatus::Completed, dec!(5), Some(dec!(200))),
            entry(run_id, TradeStatus::Failed, Decimal::ZERO, None),
        ];
        let summary = run_summary(&entries).unwrap();
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_filled_value, dec!(2000));
        assert_eq!(summary.success_rate.unwrap().value, dec!(0.6666666666666666666666666667));
    }
}
