//! The append-only trade ledger: one [`TradeLedgerEntry`] row per attempted
//! trade, consumed by the CLI `status` command and by analytics reporting.

use async_trait::async_trait;
use glidepath_core_types::{RunId, TradeLedgerEntry};
use parking_lot::Mutex;

/// Sink for ledger rows. An entry is appended once, when a trade first
/// reaches a terminal state; rows are never mutated afterward.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    async fn append(&self, entry: TradeLedgerEntry);

    async fn entries_for_run(&self, run_id: &RunId) -> Vec<TradeLedgerEntry>;

    async fn all_entries(&self) -> Vec<TradeLedgerEntry>;
}

/// An in-memory ledger, ordered by insertion (oldest first).
#[derive(Debug, Default)]
pub struct InMemoryLedgerSink {
    entries: Mutex<Vec<TradeLedgerEntry>>,
}

impl InMemoryLedgerSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerSink for InMemoryLedgerSink {
    async fn append(&self, entry: TradeLedgerEntry) {
        self.entries.lock().push(entry);
    }

    async fn entries_for_run(&self, run_id: &RunId) -> Vec<TradeLedgerEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| &entry.run_id == run_id)
            .cloned()
            .collect()
    }

    async fn all_entries(&self) -> Vec<TradeLedgerEntry> {
        self.entries.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use glidepath_core_types::{CorrelationId, Symbol, TradeAction, TradeId, TradeStatus};
    use rust_decimal::Decimal;

    use super::*;

    fn entry(run_id: RunId) -> TradeLedgerEntry {
        TradeLedgerEntry {
            trade_id: TradeId::new(),
            run_id,
            correlation_id: CorrelationId::new(),
            symbol: Symbol::parse("AAPL").unwrap(),
            side: TradeAction::Buy,
            requested_quantity: Decimal::from(10),
            filled_quantity: Decimal::from(10),
            average_fill_price: None,
            status: TradeStatus::Completed,
            strategy_attribution: vec!["equal_weight".to_string()],
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn entries_for_run_filters_other_runs_out() {
        let sink = InMemoryLedgerSink::new();
        let run_a = RunId::new();
        let run_b = RunId::new();
        sink.append(entry(run_a)).await;
        sink.append(entry(run_b)).await;

        let rows = sink.entries_for_run(&run_a).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].run_id, run_a);
        assert_eq!(sink.all_entries().await.len(), 2);
    }
}
