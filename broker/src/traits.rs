//! The broker capability surface itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glidepath_core_types::{ExecutedOrder, OrderId, Quote, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::BrokerError;
use crate::request::OrderRequest;

/// An open equity position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub average_entry_price: Decimal,
    pub market_value: Decimal,
}

/// Account-level figures the Portfolio Stage and pre-trade gates depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub portfolio_value: Decimal,
}

/// One of a broker's daily OHLCV bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The kind of transition a trade-update stream event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeUpdateEventType {
    New,
    Fill,
    PartialFill,
    Canceled,
    Rejected,
    Expired,
    DoneForDay,
}

/// One event delivered on the trade-update stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeUpdate {
    pub order_id: OrderId,
    pub event_type: TradeUpdateEventType,
    pub filled_quantity: Decimal,
    pub average_price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// One event delivered on the market-data stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketDataEvent {
    pub symbol_index: usize,
    pub quote: Quote,
}

/// The full broker capability surface consumed by Execution. Credential
/// loading and the wire protocol for a live broker are out of scope; this
/// trait is the seam a live adapter plugs into. [`crate::PaperBrokerClient`]
/// is the one concrete, in-process implementation this crate ships.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderId, BrokerError>;

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), BrokerError>;

    async fn list_open_orders(&self) -> Result<Vec<ExecutedOrder>, BrokerError>;

    async fn get_order(&self, order_id: &OrderId) -> Result<ExecutedOrder, BrokerError>;

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError>;

    async fn get_account(&self) -> Result<Account, BrokerError>;

    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError>;

    async fn get_bars(&self, symbol: &Symbol, count: usize) -> Result<Vec<Bar>, BrokerError>;

    /// Subscribes to the single long-lived, process-wide trade-update
    /// stream. Callers should register through [`crate::TradeUpdateRouter`]
    /// rather than holding their own receiver directly, so the stream's
    /// subscription can be reference-counted.
    fn subscribe_trade_updates(&self) -> broadcast::Receiver<TradeUpdate>;

    /// Subscribes the given symbol on the broker's market-data feed;
    /// idempotent if already subscribed.
    async fn subscribe_market_data(&self, symbol: &Symbol) -> Result<(), BrokerError>;

    async fn unsubscribe_market_data(&self, symbol: &Symbol) -> Result<(), BrokerError>;

    fn is_market_open(&self, at: DateTime<Utc>) -> bool;
}
