//! Plain-text rendering of a [`RunSummary`] for the CLI `status` command.
//!
//! No PDF or email generation lives here or anywhere in this crate, both
//! are explicitly out of scope for this system.

use std::fmt::Write as _;

use crate::summary::RunSummary;

/// Renders a human-readable report. Never fails: formatting a `Decimal`/
/// `DateTime` into a `String` cannot error.
pub fn render_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {}", summary.run_id);
    let _ = writeln!(
        out,
        "  trades: {} total, {} completed, {} failed, {} in flight",
        summary.total_trades, summary.completed, summary.failed, summary.in_flight
    );
    match summary.success_rate {
        Some(rate) => {
            let _ = writeln!(out, "  success rate: {:.2}%", rate.value * rust_decimal::Decimal::from(100));
        }
        None => {
            let _ = writeln!(out, "  success rate: n/a (no trade has reached a terminal state)");
        }
    }
    let _ = writeln!(out, "  total filled value: {}", summary.total_filled_value);
    let _ = writeln!(out, "  started: {}", summary.earliest_created_at);
    match summary.latest_completed_at {
        Some(completed_at) => {
            let _ = writeln!(out, "  last trade completed: {completed_at}");
        }
        None => {
            let _ = writeln!(out, "  last trade completed: still running");
        }
    }
    if !summary.by_strategy.is_empty() {
        let _ = writeln!(out, "  by strategy:");
        for breakdown in &summary.by_strategy {
            let _ = writeln!(
                out,
                "    {}: {} trades, {} completed, {} failed, value {}",
                breakdown.strategy, breakdown.trades, breakdown.completed, breakdown.failed, breakdown.total_filled_value
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::run_summary;
    use chrono::Utc;
    use glidepath_core_types::{CorrelationId, RunId, Symbol, TradeAction, TradeId, TradeLedgerEntry, TradeStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn renders_every_field_without_panicking() {
        let run_id = RunId::new();
        let now = Utc::now();
        let entries = vec![TradeLedgerEntry {
            trade_id: TradeId::new(),
            run_id,
            correlation_id: CorrelationId::new(),
            symbol: Symbol::parse("AAPL").unwrap(),
            side: TradeAction::Buy,
            requested_quantity: dec!(10),
            filled_quantity: dec!(10),
            average_fill_price: Some(dec!(100)),
            status: TradeStatus::Completed,
            strategy_attribution: vec!["equal_weight".to_string()],
            created_at: now,
            completed_at: Some(now),
        }];
        let summary = run_summary(&entries).unwrap();
        let rendered = render_run_summary(&summary);
        assert!(rendered.contains("1 total, 1 completed"));
        assert!(rendered.contains("equal_weight"));
    }
}
