//! The per-trade pipeline: pre-trade gating, smart-limit submission with
//! bounded re-pegging, a market-order fallback, and run-state completion.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use glidepath_broker::{BrokerClient, OrderKind, OrderRequest, TradeUpdateEventType, TradeUpdateRouter};
use glidepath_core_types::{
    CausationId, ExecutedOrder, OrderId, OrderStatus, Quote, RunId, RunStatus, Symbol, TradeMessage, TradeStatus,
};
use glidepath_events::{Envelope, EventBus, WorkflowEvent, WorkflowFailed};
use glidepath_quotes::QuoteCache;
use glidepath_risk::{order_size_check, structural_validation_check, GatingLimits};
use glidepath_runstate::RunStateStore;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::error::ExecutionError;
use crate::params::ExecutionParams;
use crate::pricing;

/// Running total of filled quantity and notional across every attempt
/// (limit re-pegs and the market fallback) submitted for one trade, each
/// of which is its own broker order with its own `order_id`. Aggregating
/// here is what keeps `Σ filled(attempts) <= requested` instead of each
/// re-peg resubmitting the full notional on top of a prior partial fill.
#[derive(Debug, Default, Clone, Copy)]
struct Fills {
    quantity: Decimal,
    notional: Decimal,
}

impl Fills {
    fn record(&mut self, order: &ExecutedOrder) {
        if order.filled_quantity > Decimal::ZERO {
            self.notional += order.filled_quantity * order.average_fill_price.unwrap_or(Decimal::ZERO);
            self.quantity += order.filled_quantity;
        }
    }

    fn average_price(&self) -> Option<Decimal> {
        (!self.quantity.is_zero()).then(|| self.notional / self.quantity)
    }

    /// Folds the running totals into `last` (the most recent attempt's
    /// order), which supplies every field this type doesn't itself track.
    fn into_order(self, last: ExecutedOrder, requested_quantity: Decimal) -> ExecutedOrder {
        let status = if pricing::fill_ratio_met(self.quantity, requested_quantity) {
            OrderStatus::Filled
        } else if self.quantity > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else {
            last.status
        };
        ExecutedOrder {
            requested_quantity,
            filled_quantity: self.quantity,
            average_fill_price: self.average_price(),
            status,
            ..last
        }
    }
}

/// What [`TradeExecutor::execute`] did with one trade.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The idempotency check (pre-trade gating step 1) found the trade
    /// already terminal; no broker call was made.
    AlreadyTerminal { status: TradeStatus },
    Executed(ExecutedOrder),
}

/// Executes one [`TradeMessage`] end to end against a live [`BrokerClient`],
/// updating [`glidepath_runstate::RunStateStore`] and publishing the
/// workflow-completion event through [`EventBus`] the instant the run's
/// last trade resolves.
pub struct TradeExecutor {
    broker: Arc<dyn BrokerClient>,
    quotes: Arc<QuoteCache>,
    run_state: Arc<dyn RunStateStore>,
    trade_updates: Arc<TradeUpdateRouter>,
    event_bus: Arc<dyn EventBus>,
    gating_limits: GatingLimits,
    params: ExecutionParams,
}

impl std::fmt::Debug for TradeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeExecutor").field("params", &self.params).finish_non_exhaustive()
    }
}

impl TradeExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        quotes: Arc<QuoteCache>,
        run_state: Arc<dyn RunStateStore>,
        trade_updates: Arc<TradeUpdateRouter>,
        event_bus: Arc<dyn EventBus>,
        gating_limits: GatingLimits,
        params: ExecutionParams,
    ) -> Self {
        Self {
            broker,
            quotes,
            run_state,
            trade_updates,
            event_bus,
            gating_limits,
            params,
        }
    }

    /// Runs pre-trade gating steps 1 through 5 then, if admitted, the
    /// smart-limit pipeline, recording the result on the run and
    /// publishing the run's completion event if this was its last trade.
    pub async fn execute(&self, trade: &TradeMessage) -> Result<ExecutionOutcome, ExecutionError> {
        if let Some(status) = self.run_state.terminal_status(&trade.run_id, &trade.trade_id).await? {
            return Ok(ExecutionOutcome::AlreadyTerminal { status });
        }

        if let Err(gating_error) =
            structural_validation_check(&trade.symbol, trade.action, trade.trade_amount, &self.gating_limits)
                .and_then(|()| order_size_check(&trade.symbol, trade.trade_amount, &self.gating_limits))
        {
            self.run_state
                .mark_completed(&trade.run_id, &trade.trade_id, false, None, Some(gating_error.to_string()))
                .await?;
            self.finalize_run(&trade.run_id).await;
            return Err(gating_error.into());
        }

        let market_is_open = self.broker.is_market_open(Utc::now());
        if let Err(run_state_error) = self
            .run_state
            .admit_trade(
                &trade.run_id,
                &trade.trade_id,
                &trade.symbol,
                trade.trade_amount,
                &self.gating_limits,
                market_is_open,
                self.params.bypass_market_hours,
            )
            .await
        {
            self.finalize_run(&trade.run_id).await;
            return Err(run_state_error.into());
        }

        match self.run_smart_limit(trade).await {
            Ok(order) => {
                let success = pricing::fill_ratio_met(order.filled_quantity, order.requested_quantity);
                let error = (!success)
                    .then(|| format!("{} with {}/{} filled", order.status, order.filled_quantity, order.requested_quantity));
                self.run_state
                    .mark_completed(&trade.run_id, &trade.trade_id, success, Some(order.order_id.clone()), error)
                    .await?;
                self.finalize_run(&trade.run_id).await;
                Ok(ExecutionOutcome::Executed(order))
            }
            Err(execution_error) => {
                self.run_state
                    .mark_completed(&trade.run_id, &trade.trade_id, false, None, Some(execution_error.to_string()))
                    .await?;
                self.finalize_run(&trade.run_id).await;
                Err(execution_error)
            }
        }
    }

    async fn finalize_run(&self, run_id: &RunId) {
        match self.run_state.try_claim_completion(run_id).await {
            Ok(true) => self.publish_completion(run_id).await,
            Ok(false) => {}
            Err(error) => tracing::warn!(%run_id, %error, "failed to evaluate run completion"),
        }
    }

    async fn publish_completion(&self, run_id: &RunId) {
        let record = match self.run_state.get_run(run_id).await {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(%run_id, %error, "run vanished before its completion could be published");
                return;
            }
        };

        let event = if record.status == RunStatus::Failed {
            WorkflowEvent::WorkflowFailed(WorkflowFailed {
                run_id: Some(*run_id),
                error_kind: "ExecutionFailure".to_string(),
                error_message: format!("{} of {} trades failed", record.failed_trades, record.total_trades()),
                failed_stage: "execution".to_string(),
            })
        } else {
            let duration_ms = record
                .completed_at
                .map(|completed| (completed - record.created_at).num_milliseconds().max(0) as u64)
                .unwrap_or(0);
            WorkflowEvent::WorkflowCompleted {
                run_id: *run_id,
                status: record.status,
                succeeded_trades: record.succeeded_trades,
                failed_trades: record.failed_trades,
                total_traded_value: record.day_traded_value,
                duration_ms,
            }
        };

        let envelope = Envelope::new(record.correlation_id, CausationId::new(), run_id.to_string(), event);
        if let Err(error) = self.event_bus.publish(envelope).await {
            tracing::warn!(%run_id, %error, "failed to publish workflow completion event");
        }
    }

    /// Steps 1 (quote) through 6 (market fallback) of the smart-limit
    /// pipeline; result aggregation (step 7) is the caller's concern.
    async fn run_smart_limit(&self, trade: &TradeMessage) -> Result<ExecutedOrder, ExecutionError> {
        self.quotes
            .subscribe(trade.symbol.clone())
            .await
            .map_err(|source| ExecutionError::QuoteUnavailable { symbol: trade.symbol.clone(), source })?;
        let result = self.run_smart_limit_inner(trade).await;
        if let Err(error) = self.quotes.unsubscribe(&trade.symbol).await {
            tracing::warn!(symbol = %trade.symbol, %error, "failed to release quote subscription");
        }
        result
    }

    async fn run_smart_limit_inner(&self, trade: &TradeMessage) -> Result<ExecutedOrder, ExecutionError> {
        let held_quantity = self.held_quantity(&trade.symbol).await?;
        let timeout = self.params.timeout_for(trade.action);
        let aggressiveness = self.params.peg_aggressiveness_for(trade.action);

        let mut requested_quantity: Option<Decimal> = None;
        let mut filled = Fills::default();
        let mut last_order: Option<ExecutedOrder> = None;

        for attempt in 1..=self.params.max_repegs {
            let quote = self.fresh_quote(&trade.symbol).await?;
            let Some(limit_price) = pricing::limit_price(&quote, trade.action, aggressiveness, self.params.spread_wide_bps)
            else {
                tracing::warn!(symbol = %trade.symbol, "spread too wide to peg a limit order; falling through to a market order");
                break;
            };

            let total_quantity =
                *requested_quantity.get_or_insert_with(|| pricing::quantity_for_notional(trade.trade_amount, limit_price));
            if total_quantity.is_zero() {
                return Err(ExecutionError::ZeroQuantity { symbol: trade.symbol.clone(), price: limit_price });
            }
            let remaining = total_quantity - filled.quantity;
            if remaining <= Decimal::ZERO {
                break;
            }

            let order_id = self.submit_priced(trade, limit_price, remaining, held_quantity, attempt).await?;
            let mut receiver = self.trade_updates.register(order_id.clone());
            let terminal = self.await_terminal_event(&mut receiver, timeout).await;
            self.trade_updates.unregister(&order_id);

            if terminal.is_some() {
                let order = self.broker.get_order(&order_id).await?;
                filled.record(&order);
                last_order = Some(order);
            } else {
                let _ = self.broker.cancel_order(&order_id).await;
                // A cancel can still race a fill; re-check the authoritative state.
                if let Ok(order) = self.broker.get_order(&order_id).await {
                    filled.record(&order);
                    last_order = Some(order);
                }
            }

            if pricing::fill_ratio_met(filled.quantity, total_quantity) {
                return Ok(filled.into_order(last_order.expect("an order was recorded this attempt"), total_quantity));
            }

            if attempt < self.params.max_repegs {
                tokio::time::sleep(self.params.repeg_interval).await;
            }
        }

        self.market_fallback(trade, held_quantity, requested_quantity, filled, last_order).await
    }

    async fn market_fallback(
        &self,
        trade: &TradeMessage,
        held_quantity: Decimal,
        requested_quantity: Option<Decimal>,
        mut filled: Fills,
        last_order: Option<ExecutedOrder>,
    ) -> Result<ExecutedOrder, ExecutionError> {
        let quote = self.fresh_quote(&trade.symbol).await?;
        let mid = quote.mid();
        let total_quantity = requested_quantity.unwrap_or_else(|| pricing::quantity_for_notional(trade.trade_amount, mid));
        if total_quantity.is_zero() {
            return Err(ExecutionError::ZeroQuantity { symbol: trade.symbol.clone(), price: mid });
        }
        let remaining = total_quantity - filled.quantity;
        if remaining <= Decimal::ZERO {
            return Ok(filled.into_order(last_order.expect("a prior attempt filled the whole order"), total_quantity));
        }

        let kind = if pricing::should_close_position(trade.action, remaining, held_quantity, self.params.close_position_threshold)
        {
            OrderKind::ClosePosition
        } else {
            OrderKind::Market { quantity: remaining }
        };
        let request = OrderRequest::new(trade.trade_id, trade.symbol.clone(), trade.action, kind, self.params.max_repegs + 1);
        let order_id = self.broker.submit_order(request).await?;

        let mut receiver = self.trade_updates.register(order_id.clone());
        let timeout = self.params.timeout_for(trade.action);
        let terminal = self.await_terminal_event(&mut receiver, timeout).await;
        self.trade_updates.unregister(&order_id);

        if terminal.is_none() {
            return Err(ExecutionError::ExecutionTimeout { symbol: trade.symbol.clone(), order_id });
        }

        let order = self.broker.get_order(&order_id).await?;
        filled.record(&order);
        let combined = filled.into_order(order, total_quantity);
        if combined.filled_quantity.is_zero() {
            return Err(ExecutionError::PersistentFillFailure {
                symbol: trade.symbol.clone(),
                filled: combined.filled_quantity,
                requested: total_quantity,
            });
        }
        Ok(combined)
    }

    async fn submit_priced(
        &self,
        trade: &TradeMessage,
        limit_price: Decimal,
        quantity: Decimal,
        held_quantity: Decimal,
        attempt: u32,
    ) -> Result<OrderId, ExecutionError> {
        let kind = if pricing::should_close_position(trade.action, quantity, held_quantity, self.params.close_position_threshold)
        {
            OrderKind::ClosePosition
        } else {
            OrderKind::Limit { limit_price, quantity }
        };
        let request = OrderRequest::new(trade.trade_id, trade.symbol.clone(), trade.action, kind, attempt);
        Ok(self.broker.submit_order(request).await?)
    }

    async fn held_quantity(&self, symbol: &Symbol) -> Result<Decimal, ExecutionError> {
        let positions = self.broker.get_positions().await?;
        Ok(positions.into_iter().find(|position| &position.symbol == symbol).map(|position| position.quantity).unwrap_or(Decimal::ZERO))
    }

    /// Quote acquisition (smart-limit pipeline step 1): the cache is
    /// checked first, and a cache miss or stale entry falls back to a
    /// direct REST snapshot from the broker, bounded by `quote_timeout`.
    /// A successful fallback seeds the cache so the next attempt can read
    /// it straight off without another round trip.
    async fn fresh_quote(&self, symbol: &Symbol) -> Result<Quote, ExecutionError> {
        let cache_error = match self.quotes.get_fresh(symbol, self.params.quote_max_staleness) {
            Ok(quote) => return Ok(quote),
            Err(error) => error,
        };

        match tokio::time::timeout(self.params.quote_timeout, self.broker.get_quote(symbol)).await {
            Ok(Ok(quote)) => {
                self.quotes.update(symbol.clone(), quote);
                Ok(quote)
            }
            Ok(Err(broker_error)) => Err(broker_error.into()),
            Err(_elapsed) => Err(ExecutionError::QuoteUnavailable { symbol: symbol.clone(), source: cache_error }),
        }
    }

    /// Drains trade-update events until one signals a terminal broker
    /// state or `timeout` elapses, returning the terminal event's type (the
    /// caller re-fetches the authoritative [`ExecutedOrder`] afterward).
    async fn await_terminal_event(
        &self,
        receiver: &mut mpsc::UnboundedReceiver<glidepath_broker::TradeUpdate>,
        timeout: Duration,
    ) -> Option<TradeUpdateEventType> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, receiver.recv()).await {
                Ok(Some(update)) if is_terminal_event(update.event_type) => return Some(update.event_type),
                Ok(Some(_)) => continue,
                _ => return None,
            }
        }
    }
}

fn is_terminal_event(event_type: TradeUpdateEventType) -> bool {
    matches!(
        event_type,
        TradeUpdateEventType::Fill
            | TradeUpdateEventType::Canceled
            | TradeUpdateEventType::Rejected
            | TradeUpdateEventType::Expired
            | TradeUpdateEventType::DoneForDay
    )
}
