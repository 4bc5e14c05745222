//! The Run-State Store trait and its in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use glidepath_core_types::{
    CorrelationId, ExecutionRunRecord, OrderId, PlanId, RunId, RunStatus, Symbol, TradeDescriptor, TradeId, TradeStatus,
};
use glidepath_risk::GatingLimits;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::RunStateError;

/// A key-value store with conditional writes and atomic counter/list
/// updates over one run's bookkeeping. All multi-field updates within one
/// call are atomic; `completion_published_flag` is write-once.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    async fn create_run(
        &self,
        run_id: RunId,
        plan_id: PlanId,
        correlation_id: CorrelationId,
        trades: Vec<TradeDescriptor>,
    ) -> Result<(), RunStateError>;

    /// The idempotency check (pre-trade gating step 1): `Some(status)` if
    /// the trade has already reached a terminal state, `None` if it has
    /// not, enabling the caller to short-circuit and return the stored
    /// result without a broker call.
    async fn terminal_status(&self, run_id: &RunId, trade_id: &TradeId) -> Result<Option<TradeStatus>, RunStateError>;

    /// Pre-trade gating steps 3 through 5 combined into one critical
    /// section: market hours, then the daily-limit gate against the live
    /// `day_traded_value`, and on success moves the trade from `pending`
    /// to `running` (transitioning the run PENDING -> RUNNING if this is
    /// its first trade). On rejection the trade is moved straight to
    /// `failed`, per the failure taxonomy ("no retry; run continues with
    /// other trades").
    #[allow(clippy::too_many_arguments)]
    async fn admit_trade(
        &self,
        run_id: &RunId,
        trade_id: &TradeId,
        symbol: &Symbol,
        trade_amount: Decimal,
        limits: &GatingLimits,
        market_is_open: bool,
        bypass_market_hours: bool,
    ) -> Result<(), RunStateError>;

    async fn mark_completed(
        &self,
        run_id: &RunId,
        trade_id: &TradeId,
        success: bool,
        order_id: Option<OrderId>,
        error: Option<String>,
    ) -> Result<(), RunStateError>;

    async fn get_run(&self, run_id: &RunId) -> Result<ExecutionRunRecord, RunStateError>;

    /// Attempts the one-shot completion CAS: succeeds (returns `true`)
    /// only for the single caller that wins the race once
    /// `completed_trades == total_trades`; every other caller, including
    /// one that arrives after the flag is already set, gets `false`.
    async fn try_claim_completion(&self, run_id: &RunId) -> Result<bool, RunStateError>;

    async fn get_daily_traded_value(&self, run_id: &RunId) -> Result<Decimal, RunStateError>;
}

/// A single-process, mutex-serialized [`RunStateStore`].
///
/// The run-state CAS operations map directly onto critical sections
/// under one `parking_lot::Mutex` per run: for a single process
/// a mutex *is* compare-and-swap, so no retry loop is needed here. A
/// multi-process deployment needs a store backed by a real conditional
/// write (DynamoDB `ConditionExpression`, Postgres `SELECT ... FOR
/// UPDATE`, ...); this type documents that single-writer-process
/// assumption rather than hiding it.
pub struct InMemoryRunStateStore {
    runs: Mutex<HashMap<RunId, ExecutionRunRecord>>,
}

impl std::fmt::Debug for InMemoryRunStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRunStateStore")
            .field("runs", &self.runs.lock().len())
            .finish()
    }
}

impl InMemoryRunStateStore {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRunStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunStateStore for InMemoryRunStateStore {
    async fn create_run(
        &self,
        run_id: RunId,
        plan_id: PlanId,
        correlation_id: CorrelationId,
        trades: Vec<TradeDescriptor>,
    ) -> Result<(), RunStateError> {
        let record = ExecutionRunRecord::new(run_id, plan_id, correlation_id, trades, Utc::now());
        self.runs.lock().insert(run_id, record);
        Ok(())
    }

    async fn terminal_status(&self, run_id: &RunId, trade_id: &TradeId) -> Result<Option<TradeStatus>, RunStateError> {
        let runs = self.runs.lock();
        let record = runs.get(run_id).ok_or(RunStateError::RunNotFound(*run_id))?;
        if record.completed_trade_ids.contains(trade_id) {
            Ok(Some(TradeStatus::Completed))
        } else if record.failed_trade_ids.contains(trade_id) {
            Ok(Some(TradeStatus::Failed))
        } else {
            Ok(None)
        }
    }

    async fn admit_trade(
        &self,
        run_id: &RunId,
        trade_id: &TradeId,
        symbol: &Symbol,
        trade_amount: Decimal,
        limits: &GatingLimits,
        market_is_open: bool,
        bypass_market_hours: bool,
    ) -> Result<(), RunStateError> {
        let mut runs = self.runs.lock();
        let record = runs.get_mut(run_id).ok_or(RunStateError::RunNotFound(*run_id))?;

        let gate_result = glidepath_risk::market_hours_check(symbol, market_is_open, bypass_market_hours)
            .and_then(|()| glidepath_risk::daily_limit_check(record.day_traded_value, trade_amount, limits));

        if let Err(gating_error) = gate_result {
            record.pending_trade_ids.remove(trade_id);
            record.running_trade_ids.remove(trade_id);
            record.failed_trade_ids.insert(*trade_id);
            record.failed_trades += 1;
            if let Some(per_trade) = record.trade_statuses.get_mut(trade_id) {
                per_trade.status = TradeStatus::Failed;
                per_trade.error = Some(gating_error.to_string());
                per_trade.completed_at = Some(Utc::now());
            }
            if record.status == RunStatus::Pending {
                record.status = RunStatus::Running;
            }
            return Err(gating_error.into());
        }

        record.day_traded_value += trade_amount.abs();
        record.pending_trade_ids.remove(trade_id);
        record.running_trade_ids.insert(*trade_id);
        if let Some(per_trade) = record.trade_statuses.get_mut(trade_id) {
            per_trade.status = TradeStatus::Running;
            per_trade.started_at = Some(Utc::now());
        }
        if record.status == RunStatus::Pending {
            record.status = RunStatus::Running;
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        run_id: &RunId,
        trade_id: &TradeId,
        success: bool,
        order_id: Option<OrderId>,
        error: Option<String>,
    ) -> Result<(), RunStateError> {
        let mut runs = self.runs.lock();
        let record = runs.get_mut(run_id).ok_or(RunStateError::RunNotFound(*run_id))?;
        record.pending_trade_ids.remove(trade_id);
        record.running_trade_ids.remove(trade_id);
        if record.status == RunStatus::Pending {
            record.status = RunStatus::Running;
        }
        let completed_at = Utc::now();
        if success {
            record.completed_trade_ids.insert(*trade_id);
            record.succeeded_trades += 1;
        } else {
            record.failed_trade_ids.insert(*trade_id);
            record.failed_trades += 1;
        }
        if let Some(per_trade) = record.trade_statuses.get_mut(trade_id) {
            per_trade.status = if success { TradeStatus::Completed } else { TradeStatus::Failed };
            per_trade.order_id = order_id;
            per_trade.error = error;
            per_trade.completed_at = Some(completed_at);
        }

        if record.is_fully_resolved() {
            record.status = if record.failed_trades == 0 {
                RunStatus::Completed
            } else {
                RunStatus::CompletedWithErrors
            };
        }
        Ok(())
    }

    async fn get_run(&self, run_id: &RunId) -> Result<ExecutionRunRecord, RunStateError> {
        self.runs.lock().get(run_id).cloned().ok_or(RunStateError::RunNotFound(*run_id))
    }

    async fn try_claim_completion(&self, run_id: &RunId) -> Result<bool, RunStateError> {
        let mut runs = self.runs.lock();
        let record = runs.get_mut(run_id).ok_or(RunStateError::RunNotFound(*run_id))?;
        if !record.is_fully_resolved() || record.completion_published_flag {
            return Ok(false);
        }
        record.completion_published_flag = true;
        record.completed_at = Some(Utc::now());
        Ok(true)
    }

    async fn get_daily_traded_value(&self, run_id: &RunId) -> Result<Decimal, RunStateError> {
        Ok(self.runs.lock().get(run_id).ok_or(RunStateError::RunNotFound(*run_id))?.day_traded_value)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn symbol() -> Symbol {
        Symbol::parse("AAPL").unwrap()
    }

    fn limits() -> GatingLimits {
        GatingLimits {
            min_trade_amount_usd: dec!(5),
            max_single_order_usd: dec!(100000),
            max_daily_trade_value_usd: dec!(500000),
        }
    }

    fn descriptor(trade_id: TradeId) -> TradeDescriptor {
        TradeDescriptor {
            trade_id,
            symbol: symbol(),
            action: glidepath_core_types::TradeAction::Buy,
            phase: glidepath_core_types::Phase::Buy,
        }
    }

    async fn seeded_run(store: &InMemoryRunStateStore, trade_ids: Vec<TradeId>) -> RunId {
        let run_id = RunId::new();
        let trades = trade_ids.into_iter().map(descriptor).collect();
        store
            .create_run(run_id, PlanId::new(), CorrelationId::new(), trades)
            .await
            .unwrap();
        run_id
    }

    #[tokio::test]
    async fn total_trades_invariant_holds_across_the_trade_lifecycle() {
        let store = InMemoryRunStateStore::new();
        let trade = TradeId::new();
        let run_id = seeded_run(&store, vec![trade]).await;

        store
            .admit_trade(&run_id, &trade, &symbol(), dec!(20000), &limits(), true, false)
            .await
            .unwrap();
        let record = store.get_run(&run_id).await.unwrap();
        assert_eq!(record.total_trades(), 1);
        assert_eq!(record.running_trade_ids.len(), 1);
        assert_eq!(record.trade_statuses[&trade].status, TradeStatus::Running);

        let order_id = OrderId::from("paper-1");
        store.mark_completed(&run_id, &trade, true, Some(order_id.clone()), None).await.unwrap();
        let record = store.get_run(&run_id).await.unwrap();
        assert_eq!(record.total_trades(), 1);
        assert_eq!(record.status, RunStatus::Completed);
        let per_trade = &record.trade_statuses[&trade];
        assert_eq!(per_trade.status, TradeStatus::Completed);
        assert_eq!(per_trade.order_id, Some(order_id));
        assert!(per_trade.completed_at.is_some());
    }

    #[tokio::test]
    async fn daily_limit_gate_fails_the_trade_without_retry() {
        let store = InMemoryRunStateStore::new();
        let trade = TradeId::new();
        let run_id = seeded_run(&store, vec![trade]).await;

        let err = store
            .admit_trade(&run_id, &trade, &symbol(), dec!(600000), &limits(), true, false)
            .await
            .unwrap_err();
        assert!(matches!(err, RunStateError::Gating(glidepath_risk::GatingError::DailyLimitExceeded { .. })));

        let record = store.get_run(&run_id).await.unwrap();
        assert!(record.failed_trade_ids.contains(&trade));
        assert_eq!(record.failed_trades, 1);
        let per_trade = &record.trade_statuses[&trade];
        assert_eq!(per_trade.status, TradeStatus::Failed);
        assert!(per_trade.error.is_some());
    }

    #[tokio::test]
    async fn completion_cas_grants_exactly_one_winner() {
        let store = InMemoryRunStateStore::new();
        let trade_a = TradeId::new();
        let trade_b = TradeId::new();
        let run_id = seeded_run(&store, vec![trade_a, trade_b]).await;

        store
            .admit_trade(&run_id, &trade_a, &symbol(), dec!(100), &limits(), true, false)
            .await
            .unwrap();
        store
            .admit_trade(&run_id, &trade_b, &symbol(), dec!(100), &limits(), true, false)
            .await
            .unwrap();
        store.mark_completed(&run_id, &trade_a, true, None, None).await.unwrap();
        store.mark_completed(&run_id, &trade_b, true, None, None).await.unwrap();

        let first = store.try_claim_completion(&run_id).await.unwrap();
        let second = store.try_claim_completion(&run_id).await.unwrap();
        assert!(first);
        assert!(!second);
    }
}
