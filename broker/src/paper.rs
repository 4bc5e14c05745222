//! An in-memory simulated exchange: enough of a broker to drive the
//! Execution Stage end-to-end in tests and in `paper` CLI mode, without a
//! real wire protocol. Fills are not simulated automatically on a
//! realistic clock; tests drive them explicitly via [`PaperBrokerClient::simulate_fill`]
//! and [`PaperBrokerClient::simulate_terminal`], which is what makes the
//! re-peg and settlement scenarios deterministically testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glidepath_core_types::{ExecutedOrder, OrderId, OrderStatus, Quote, Symbol, SubmissionStrategy};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::error::BrokerError;
use crate::request::{OrderKind, OrderRequest};
use crate::traits::{Account, Bar, BrokerClient, Position, TradeUpdate, TradeUpdateEventType};

#[derive(Debug)]
struct PaperState {
    orders: HashMap<OrderId, ExecutedOrder>,
    positions: HashMap<Symbol, Position>,
    account: Account,
    quotes: HashMap<Symbol, Quote>,
}

/// An in-memory [`BrokerClient`]. Always reports the market as open unless
/// constructed with [`PaperBrokerClient::with_market_hours`].
pub struct PaperBrokerClient {
    state: Arc<Mutex<PaperState>>,
    trade_updates: broadcast::Sender<TradeUpdate>,
    order_seq: AtomicU64,
    market_always_open: bool,
}

impl std::fmt::Debug for PaperBrokerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperBrokerClient").finish_non_exhaustive()
    }
}

impl PaperBrokerClient {
    pub fn new(account: Account) -> Self {
        let (trade_updates, _) = broadcast::channel(1024);
        Self {
            state: Arc::new(Mutex::new(PaperState {
                orders: HashMap::new(),
                positions: HashMap::new(),
                account,
                quotes: HashMap::new(),
            })),
            trade_updates,
            order_seq: AtomicU64::new(0),
            market_always_open: true,
        }
    }

    pub fn with_market_hours(mut self, always_open: bool) -> Self {
        self.market_always_open = always_open;
        self
    }

    /// Seeds a position the paper account already holds, used to set up
    /// the "current positions" side of a rebalance scenario.
    pub fn seed_position(&self, position: Position) {
        self.state.lock().positions.insert(position.symbol.clone(), position);
    }

    /// Seeds or updates the latest quote for a symbol.
    pub fn set_quote(&self, symbol: Symbol, quote: Quote) {
        self.state.lock().quotes.insert(symbol, quote);
    }

    fn next_order_id(&self) -> OrderId {
        let seq = self.order_seq.fetch_add(1, Ordering::Relaxed);
        OrderId::from(format!("PAPER-{seq}"))
    }

    /// Advances an order's fill state and broadcasts the corresponding
    /// trade update, as a real broker's stream would.
    pub fn simulate_fill(&self, order_id: &OrderId, filled_quantity: Decimal, average_price: Decimal, now: DateTime<Utc>) {
        let mut state = self.state.lock();
        if let Some(order) = state.orders.get_mut(order_id) {
            order.filled_quantity = filled_quantity;
            order.average_fill_price = Some(average_price);
            order.status = if order.filled_quantity >= order.requested_quantity {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            order.last_update_at = now;
            if order.status == OrderStatus::Filled {
                order.terminal_at = Some(now);
            }
            let event_type = if order.status == OrderStatus::Filled {
                TradeUpdateEventType::Fill
            } else {
                TradeUpdateEventType::PartialFill
            };
            let _ = self.trade_updates.send(TradeUpdate {
                order_id: order_id.clone(),
                event_type,
                filled_quantity,
                average_price: Some(average_price),
                timestamp: now,
            });
        }
    }

    /// Forces an order to a terminal non-fill state (canceled, rejected,
    /// expired), as produced by a real re-peg cancel or a broker rejection.
    pub fn simulate_terminal(&self, order_id: &OrderId, status: OrderStatus, now: DateTime<Utc>) {
        let mut state = self.state.lock();
        if let Some(order) = state.orders.get_mut(order_id) {
            order.status = status;
            order.last_update_at = now;
            order.terminal_at = Some(now);
            let event_type = match status {
                OrderStatus::Canceled => TradeUpdateEventType::Canceled,
                OrderStatus::Rejected => TradeUpdateEventType::Rejected,
                OrderStatus::Expired => TradeUpdateEventType::Expired,
                _ => TradeUpdateEventType::New,
            };
            let _ = self.trade_updates.send(TradeUpdate {
                order_id: order_id.clone(),
                event_type,
                filled_quantity: order.filled_quantity,
                average_price: order.average_fill_price,
                timestamp: now,
            });
        }
    }
}

#[async_trait]
impl BrokerClient for PaperBrokerClient {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderId, BrokerError> {
        let order_id = self.next_order_id();
        let now = Utc::now();

        let (requested_quantity, submission_strategy) = match &request.kind {
            OrderKind::Limit { quantity, .. } => (*quantity, SubmissionStrategy::Limit),
            OrderKind::Market { quantity } => (*quantity, SubmissionStrategy::Market),
            OrderKind::Notional { amount } => {
                let quote = self
                    .state
                    .lock()
                    .quotes
                    .get(&request.symbol)
                    .copied()
                    .ok_or_else(|| BrokerError::UnknownSymbol(request.symbol.clone()))?;
                (amount / quote.ask_price, SubmissionStrategy::Market)
            }
            OrderKind::ClosePosition => {
                let quantity = self
                    .state
                    .lock()
                    .positions
                    .get(&request.symbol)
                    .map(|position| position.quantity)
                    .unwrap_or(Decimal::ZERO);
                (quantity, SubmissionStrategy::Liquidate)
            }
        };

        let order = ExecutedOrder {
            order_id: order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            requested_quantity,
            filled_quantity: Decimal::ZERO,
            average_fill_price: None,
            status: OrderStatus::New,
            attempt_count: request.attempt_count,
            submission_strategy,
            correlation_id: glidepath_core_types::CorrelationId::new(),
            trade_id: request.trade_id,
            submitted_at: now,
            last_update_at: now,
            terminal_at: None,
        };

        self.state.lock().orders.insert(order_id.clone(), order);
        let _ = self.trade_updates.send(TradeUpdate {
            order_id: order_id.clone(),
            event_type: TradeUpdateEventType::New,
            filled_quantity: Decimal::ZERO,
            average_price: None,
            timestamp: now,
        });

        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), BrokerError> {
        let now = Utc::now();
        let mut state = self.state.lock();
        let order = state.orders.get_mut(order_id).ok_or_else(|| BrokerError::UnknownOrder(order_id.clone()))?;
        if order.status.is_terminal() {
            return Ok(());
        }
        order.status = OrderStatus::Canceled;
        order.last_update_at = now;
        order.terminal_at = Some(now);
        drop(state);
        let _ = self.trade_updates.send(TradeUpdate {
            order_id: order_id.clone(),
            event_type: TradeUpdateEventType::Canceled,
            filled_quantity: Decimal::ZERO,
            average_price: None,
            timestamp: now,
        });
        Ok(())
    }

    async fn list_open_orders(&self) -> Result<Vec<ExecutedOrder>, BrokerError> {
        Ok(self
            .state
            .lock()
            .orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<ExecutedOrder, BrokerError> {
        self.state
            .lock()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownOrder(order_id.clone()))
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(self.state.lock().positions.values().cloned().collect())
    }

    async fn get_account(&self) -> Result<Account, BrokerError> {
        Ok(self.state.lock().account)
    }

    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        self.state
            .lock()
            .quotes
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerError::UnknownSymbol(symbol.clone()))
    }

    async fn get_bars(&self, _symbol: &Symbol, _count: usize) -> Result<Vec<Bar>, BrokerError> {
        Ok(Vec::new())
    }

    fn subscribe_trade_updates(&self) -> broadcast::Receiver<TradeUpdate> {
        self.trade_updates.subscribe()
    }

    async fn subscribe_market_data(&self, _symbol: &Symbol) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn unsubscribe_market_data(&self, _symbol: &Symbol) -> Result<(), BrokerError> {
        Ok(())
    }

    fn is_market_open(&self, _at: DateTime<Utc>) -> bool {
        self.market_always_open
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use glidepath_core_types::TradeAction;

    fn account() -> Account {
        Account {
            cash: dec!(50000),
            buying_power: dec!(50000),
            portfolio_value: dec!(100000),
        }
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[tokio::test]
    async fn submit_then_fill_updates_order_and_broadcasts_trade_update() {
        let broker = PaperBrokerClient::new(account());
        let mut updates = broker.subscribe_trade_updates();

        let order_id = broker
            .submit_order(OrderRequest::new(
                glidepath_core_types::TradeId::new(),
                symbol("AAPL"),
                TradeAction::Buy,
                OrderKind::Limit {
                    limit_price: dec!(150.05),
                    quantity: dec!(100),
                },
                0,
            ))
            .await
            .unwrap();

        let new_event = updates.recv().await.unwrap();
        assert_eq!(new_event.event_type, TradeUpdateEventType::New);

        broker.simulate_fill(&order_id, dec!(100), dec!(150.04), Utc::now());
        let fill_event = updates.recv().await.unwrap();
        assert_eq!(fill_event.event_type, TradeUpdateEventType::Fill);

        let order = broker.get_order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_quantity, dec!(100));
    }

    #[tokio::test]
    async fn close_position_order_uses_full_seeded_quantity() {
        let broker = PaperBrokerClient::new(account());
        broker.seed_position(Position {
            symbol: symbol("TSLA"),
            quantity: dec!(42),
            average_entry_price: dec!(200),
            market_value: dec!(8400),
        });

        let order_id = broker
            .submit_order(OrderRequest::new(
                glidepath_core_types::TradeId::new(),
                symbol("TSLA"),
                TradeAction::Sell,
                OrderKind::ClosePosition,
                0,
            ))
            .await
            .unwrap();

        let order = broker.get_order(&order_id).await.unwrap();
        assert_eq!(order.requested_quantity, dec!(42));
        assert_eq!(order.submission_strategy, SubmissionStrategy::Liquidate);
    }

    #[tokio::test]
    async fn get_quote_fails_for_unknown_symbol() {
        let broker = PaperBrokerClient::new(account());
        let err = broker.get_quote(&symbol("ZZZZ")).await.unwrap_err();
        assert!(matches!(err, BrokerError::UnknownSymbol(_)));
    }
}
