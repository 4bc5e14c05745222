//! Sharded-mode trade envelopes, executed-order records, and quotes, the
//! vocabulary the Execution Stage operates on.

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CausationId, CorrelationId, OrderId, PlanId, RunId, TradeId};
use crate::plan::{Priority, TradeAction};
use crate::symbol::Symbol;

/// Which settlement phase a trade belongs to within its run. Sells must
/// clear before buys draw on the released cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Sell,
    Buy,
}

impl Phase {
    fn base_sequence(self) -> u32 {
        match self {
            Phase::Sell => 1000,
            Phase::Buy => 2000,
        }
    }

    /// `sequence_number = (phase==SELL ? 1000 : 2000) + priority`; encodes
    /// the invariant that every SELL precedes every BUY within a run while
    /// still respecting priority ordering inside each phase.
    pub fn sequence_number(self, priority: Priority) -> u32 {
        self.base_sequence() + u32::from(priority.get())
    }
}

/// One non-HOLD plan item, lifted into its own envelope for sharded
/// dispatch. Published to an ordered channel keyed by `run_id` so that all
/// trades of one run are delivered in `sequence_number` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub run_id: RunId,
    pub trade_id: TradeId,
    pub plan_id: PlanId,
    pub correlation_id: CorrelationId,
    pub causation_id: CausationId,
    pub symbol: Symbol,
    pub action: TradeAction,
    pub trade_amount: Decimal,
    pub phase: Phase,
    pub sequence_number: u32,
    pub priority: Priority,
    pub total_portfolio_value: Decimal,
    pub run_timestamp: DateTime<Utc>,
    pub metadata: std::collections::BTreeMap<String, String>,
    pub schema_version: String,
}

impl TradeMessage {
    /// Builds the envelope and derives `sequence_number` from `phase` and
    /// `priority` rather than accepting it as a caller-supplied field, so
    /// the SELL-before-BUY invariant can't be violated by construction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: RunId,
        trade_id: TradeId,
        plan_id: PlanId,
        correlation_id: CorrelationId,
        causation_id: CausationId,
        symbol: Symbol,
        action: TradeAction,
        trade_amount: Decimal,
        phase: Phase,
        priority: Priority,
        total_portfolio_value: Decimal,
        run_timestamp: DateTime<Utc>,
        metadata: std::collections::BTreeMap<String, String>,
    ) -> Self {
        Self {
            run_id,
            trade_id,
            plan_id,
            correlation_id,
            causation_id,
            symbol,
            action,
            trade_amount,
            phase,
            sequence_number: phase.sequence_number(priority),
            priority,
            total_portfolio_value,
            run_timestamp,
            metadata,
            schema_version: "1.0".to_string(),
        }
    }
}

/// Terminal and non-terminal states of a broker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    #[serde(rename = "PARTIALLY_FILLED")]
    #[display("PARTIALLY_FILLED")]
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired)
    }
}

/// Which order-placement strategy produced an [`ExecutedOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStrategy {
    Limit,
    Market,
    Liquidate,
}

/// A broker-side order submitted on behalf of one trade. Re-pegging
/// produces a new `ExecutedOrder` linked to its predecessor by the shared
/// `trade_id` and an incrementing `attempt_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedOrder {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: TradeAction,
    pub requested_quantity: Decimal,
    pub filled_quantity: Decimal,
    pub average_fill_price: Option<Decimal>,
    pub status: OrderStatus,
    pub attempt_count: u32,
    pub submission_strategy: SubmissionStrategy,
    pub correlation_id: CorrelationId,
    pub trade_id: TradeId,
    pub submitted_at: DateTime<Utc>,
    pub last_update_at: DateTime<Utc>,
    pub terminal_at: Option<DateTime<Utc>>,
}

impl ExecutedOrder {
    pub fn fill_ratio(&self) -> Decimal {
        if self.requested_quantity.is_zero() {
            return Decimal::ZERO;
        }
        self.filled_quantity / self.requested_quantity
    }
}

/// A top-of-book snapshot for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub bid_size: Decimal,
    pub ask_size: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn mid(&self) -> Decimal {
        (self.bid_price + self.ask_price) / Decimal::from(2)
    }

    pub fn spread(&self) -> Decimal {
        self.ask_price - self.bid_price
    }

    /// Age of this quote relative to `now`, clamped to zero if `now`
    /// somehow precedes the quote's own timestamp.
    pub fn staleness_age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.timestamp).max(chrono::Duration::zero())
    }

    pub fn is_crossed_or_invalid(&self) -> bool {
        self.bid_price <= Decimal::ZERO || self.ask_price <= Decimal::ZERO || self.ask_price < self.bid_price
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn sell_sequence_numbers_are_always_below_buy_sequence_numbers() {
        let highest_sell = Phase::Sell.sequence_number(Priority::LOWEST);
        let lowest_buy = Phase::Buy.sequence_number(Priority::HIGHEST);
        assert!(highest_sell < lowest_buy);
    }

    #[test]
    fn sequence_number_respects_priority_within_a_phase() {
        let urgent = Phase::Sell.sequence_number(Priority::HIGHEST);
        let lazy = Phase::Sell.sequence_number(Priority::LOWEST);
        assert!(urgent < lazy);
    }

    #[test]
    fn quote_with_zero_spread_is_not_flagged_invalid() {
        let quote = Quote {
            bid_price: dec!(100),
            ask_price: dec!(100),
            bid_size: dec!(10),
            ask_size: dec!(10),
            timestamp: Utc::now(),
        };
        assert!(!quote.is_crossed_or_invalid());
        assert_eq!(quote.spread(), dec!(0));
    }

    #[test]
    fn quote_with_crossed_book_is_invalid() {
        let quote = Quote {
            bid_price: dec!(101),
            ask_price: dec!(100),
            bid_size: dec!(10),
            ask_size: dec!(10),
            timestamp: Utc::now(),
        };
        assert!(quote.is_crossed_or_invalid());
    }

    #[test]
    fn order_status_terminal_classification() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }
}
