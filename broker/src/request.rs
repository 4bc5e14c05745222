//! Outbound order-submission requests.

use glidepath_core_types::{Symbol, TradeId, TradeAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What kind of order to place. `Notional` lets the broker figure out
/// share quantity from a dollar amount directly (used for BUYs where the
/// broker exposes the primitive); `ClosePosition` liquidates the entire
/// open position rather than submitting a computed quantity, avoiding
/// fractional-share residue on near-full exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit { limit_price: Decimal, quantity: Decimal },
    Market { quantity: Decimal },
    Notional { amount: Decimal },
    ClosePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub side: TradeAction,
    pub kind: OrderKind,
    pub attempt_count: u32,
}

impl OrderRequest {
    pub fn new(trade_id: TradeId, symbol: Symbol, side: TradeAction, kind: OrderKind, attempt_count: u32) -> Self {
        Self {
            trade_id,
            symbol,
            side,
            kind,
            attempt_count,
        }
    }
}
