//! The numeric constants the smart-limit pipeline and batched-mode
//! settlement discipline are parameterized by. Shipped here as
//! configurable fields rather than hardcoded `const`s per the Design
//! Notes' resolution that peg aggressiveness and the repeg schedule are
//! operator-tunable configuration, not fixed policy.

use std::time::Duration;

use rust_decimal::Decimal;

/// Tuning knobs for one [`crate::executor::TradeExecutor`]. Defaults match
/// the reference values: buys peg less aggressively than sells because
/// sell proceeds gate buying power during settlement, so sells are biased
/// to clear first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionParams {
    /// Fraction of the bid/ask spread a BUY limit crosses from the bid.
    pub peg_aggressiveness_buy: Decimal,
    /// Fraction of the bid/ask spread a SELL limit crosses from the ask.
    pub peg_aggressiveness_sell: Decimal,
    pub buy_timeout: Duration,
    pub sell_timeout: Duration,
    pub max_repegs: u32,
    pub repeg_interval: Duration,
    pub quote_max_staleness: Duration,
    /// Spread width, in basis points of mid, above which the pipeline pegs
    /// to mid rather than aggressively, to avoid paying through a thin book.
    pub spread_wide_bps: Decimal,
    pub quote_timeout: Duration,
    /// A SELL leaving less than this fraction of the held position behind
    /// is submitted as [`glidepath_broker::OrderKind::ClosePosition`]
    /// instead of a computed quantity, avoiding fractional-share residue.
    pub close_position_threshold: Decimal,
    pub settlement_timeout: Duration,
    /// Whether orders may be placed while the market is closed (paper-mode
    /// testing convenience; never set for a live broker).
    pub bypass_market_hours: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            peg_aggressiveness_buy: Decimal::new(75, 2),
            peg_aggressiveness_sell: Decimal::new(85, 2),
            buy_timeout: Duration::from_secs(15),
            sell_timeout: Duration::from_secs(10),
            max_repegs: 5,
            repeg_interval: Duration::from_secs(3),
            quote_max_staleness: Duration::from_secs(2),
            spread_wide_bps: Decimal::new(50, 0),
            quote_timeout: Duration::from_secs(1),
            close_position_threshold: Decimal::new(1, 2),
            settlement_timeout: Duration::from_secs(30),
            bypass_market_hours: false,
        }
    }
}

impl ExecutionParams {
    pub fn timeout_for(&self, side: glidepath_core_types::TradeAction) -> Duration {
        match side {
            glidepath_core_types::TradeAction::Sell => self.sell_timeout,
            _ => self.buy_timeout,
        }
    }

    pub fn peg_aggressiveness_for(&self, side: glidepath_core_types::TradeAction) -> Decimal {
        match side {
            glidepath_core_types::TradeAction::Sell => self.peg_aggressiveness_sell,
            _ => self.peg_aggressiveness_buy,
        }
    }
}
