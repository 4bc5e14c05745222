//! The Run-State Store's record types: the durable, monotonically-mutated
//! bookkeeping for one sharded execution run.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CorrelationId, OrderId, PlanId, RunId, TradeId};
use crate::plan::TradeAction;
use crate::symbol::Symbol;
use crate::trade::Phase;

/// Run-level status. `Completed` requires zero failed trades;
/// `CompletedWithErrors` covers the mixed-result case; `Failed` is
/// reserved for a global gate tripping (daily limit, broker outage) rather
/// than individual trade failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

/// Per-trade lifecycle status: advances PENDING → RUNNING →
/// {COMPLETED|FAILED} exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Child record of a run: the current lifecycle state of one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerTradeStatus {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub action: TradeAction,
    pub phase: Phase,
    pub status: TradeStatus,
    pub order_id: Option<OrderId>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The fields of a trade a run needs up front to seed that trade's
/// [`PerTradeStatus`] child record, before gating has even run on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDescriptor {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub action: TradeAction,
    pub phase: Phase,
}

/// Durable record of one run's expected trades, per-trade status sets,
/// cumulative daily traded value, and the one-shot completion flag.
///
/// `total_trades` always equals `|pending| + |running| + |completed| +
/// |failed|` under atomic updates; enforced here by deriving the count
/// from the sets rather than storing it as an independently-mutable
/// field, so the invariant cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRunRecord {
    pub run_id: RunId,
    pub plan_id: PlanId,
    pub correlation_id: CorrelationId,
    pub status: RunStatus,
    pub pending_trade_ids: BTreeSet<TradeId>,
    pub running_trade_ids: BTreeSet<TradeId>,
    pub completed_trade_ids: BTreeSet<TradeId>,
    pub failed_trade_ids: BTreeSet<TradeId>,
    pub succeeded_trades: u32,
    pub failed_trades: u32,
    pub day_traded_value: Decimal,
    pub completion_published_flag: bool,
    /// Per-trade child records, keyed by trade id. Seeded PENDING for every
    /// trade at run creation and advanced in place as gating and execution
    /// move each trade through its lifecycle.
    pub trade_statuses: BTreeMap<TradeId, PerTradeStatus>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ttl: DateTime<Utc>,
}

impl ExecutionRunRecord {
    pub fn new(
        run_id: RunId,
        plan_id: PlanId,
        correlation_id: CorrelationId,
        trades: impl IntoIterator<Item = TradeDescriptor>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut pending_trade_ids = BTreeSet::new();
        let mut trade_statuses = BTreeMap::new();
        for trade in trades {
            pending_trade_ids.insert(trade.trade_id);
            trade_statuses.insert(
                trade.trade_id,
                PerTradeStatus {
                    trade_id: trade.trade_id,
                    symbol: trade.symbol,
                    action: trade.action,
                    phase: trade.phase,
                    status: TradeStatus::Pending,
                    order_id: None,
                    error: None,
                    started_at: None,
                    completed_at: None,
                },
            );
        }
        Self {
            run_id,
            plan_id,
            correlation_id,
            status: RunStatus::Pending,
            pending_trade_ids,
            running_trade_ids: BTreeSet::new(),
            completed_trade_ids: BTreeSet::new(),
            failed_trade_ids: BTreeSet::new(),
            succeeded_trades: 0,
            failed_trades: 0,
            day_traded_value: Decimal::ZERO,
            completion_published_flag: false,
            trade_statuses,
            created_at,
            completed_at: None,
            ttl: created_at + chrono::Duration::days(30),
        }
    }

    pub fn total_trades(&self) -> usize {
        self.pending_trade_ids.len()
            + self.running_trade_ids.len()
            + self.completed_trade_ids.len()
            + self.failed_trade_ids.len()
    }

    pub fn completed_trades(&self) -> usize {
        self.completed_trade_ids.len() + self.failed_trade_ids.len()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.completed_trades() == self.total_trades()
    }
}

/// Append-only row written for every attempted trade, consumed by the CLI
/// `status` command and by reporting. Promoted from "optional" in the
/// external-interfaces surface to a concrete, always-written record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLedgerEntry {
    pub trade_id: TradeId,
    pub run_id: RunId,
    pub correlation_id: CorrelationId,
    pub symbol: Symbol,
    pub side: TradeAction,
    pub requested_quantity: Decimal,
    pub filled_quantity: Decimal,
    pub average_fill_price: Option<Decimal>,
    pub status: TradeStatus,
    pub strategy_attribution: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> TradeDescriptor {
        TradeDescriptor {
            trade_id: TradeId::new(),
            symbol: Symbol::parse("AAPL").unwrap(),
            action: TradeAction::Buy,
            phase: Phase::Buy,
        }
    }

    #[test]
    fn total_trades_equals_sum_of_all_buckets_at_every_stage() {
        let mut record = ExecutionRunRecord::new(
            RunId::new(),
            PlanId::new(),
            CorrelationId::new(),
            vec![descriptor(), descriptor(), descriptor()],
            Utc::now(),
        );
        assert_eq!(record.total_trades(), 3);
        assert_eq!(record.trade_statuses.len(), 3);

        let trade = *record.pending_trade_ids.iter().next().unwrap();
        record.pending_trade_ids.remove(&trade);
        record.running_trade_ids.insert(trade);
        assert_eq!(record.total_trades(), 3);

        record.running_trade_ids.remove(&trade);
        record.completed_trade_ids.insert(trade);
        assert_eq!(record.total_trades(), 3);
        assert!(!record.is_fully_resolved());
    }

    #[test]
    fn ttl_defaults_to_thirty_days_after_creation() {
        let now = Utc::now();
        let record = ExecutionRunRecord::new(RunId::new(), PlanId::new(), CorrelationId::new(), vec![], now);
        assert_eq!(record.ttl, now + chrono::Duration::days(30));
    }
}
