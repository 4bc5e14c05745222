//! Pure functions for the smart-limit pipeline's size and price
//! computations. Kept free of broker/quote-cache dependencies so they can
//! be tested against literal numbers without any async scaffolding.

use glidepath_core_types::{Quote, TradeAction};
use rust_decimal::{Decimal, RoundingStrategy};

/// A fill covering at least this fraction of the requested quantity counts
/// as a completed trade; anything less is a partial-fill failure even
/// though some shares did trade.
pub const MIN_ACCEPTABLE_FILL_RATIO: Decimal = Decimal::from_parts(99, 0, 0, false, 2); // 0.99

/// Bid/ask-crossing limit price for `side`, biased toward the far side of
/// the book by `aggressiveness` (0 = peg to the near touch, 1 = peg to the
/// far touch). Returns `None` when the spread is wider than
/// `spread_wide_bps` (in basis points of mid): crossing a thin, wide spread
/// aggressively risks paying well through fair value for a small fill, so
/// the caller falls through to a market order instead of pegging here.
pub fn limit_price(quote: &Quote, side: TradeAction, aggressiveness: Decimal, spread_wide_bps: Decimal) -> Option<Decimal> {
    let mid = quote.mid();
    if mid.is_zero() {
        return None;
    }
    let spread_bps = quote.spread() / mid * Decimal::from(10_000);
    if spread_bps > spread_wide_bps {
        return None;
    }
    Some(match side {
        TradeAction::Buy => quote.bid_price + quote.spread() * aggressiveness,
        TradeAction::Sell => quote.ask_price - quote.spread() * aggressiveness,
        TradeAction::Hold => mid,
    })
}

/// Quantity `trade_amount` buys/sells at `limit_price`, floored to six
/// decimal places: fractional-share fills are allowed, but never rounded
/// up past what the notional amount actually covers.
pub fn quantity_for_notional(trade_amount: Decimal, limit_price: Decimal) -> Decimal {
    if limit_price.is_zero() {
        return Decimal::ZERO;
    }
    (trade_amount.abs() / limit_price).round_dp_with_strategy(6, RoundingStrategy::ToZero)
}

/// Whether a SELL of `intended_quantity` out of a `held_quantity` position
/// is close enough to a full exit that it should be submitted as
/// [`glidepath_broker::OrderKind::ClosePosition`] instead.
pub fn should_close_position(
    side: TradeAction,
    intended_quantity: Decimal,
    held_quantity: Decimal,
    threshold: Decimal,
) -> bool {
    if side != TradeAction::Sell || held_quantity.is_zero() {
        return false;
    }
    let remainder_ratio = (held_quantity - intended_quantity).abs() / held_quantity;
    remainder_ratio <= threshold
}

/// Whether `filled` of `requested` clears [`MIN_ACCEPTABLE_FILL_RATIO`].
/// `requested <= 0` is treated as vacuously met so a fully-closed position
/// (nothing left to request) doesn't register as a failure.
pub fn fill_ratio_met(filled: Decimal, requested: Decimal) -> bool {
    if requested <= Decimal::ZERO {
        return true;
    }
    filled / requested >= MIN_ACCEPTABLE_FILL_RATIO
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;

    fn quote(bid: Decimal, ask: Decimal) -> Quote {
        Quote {
            bid_price: bid,
            ask_price: ask,
            bid_size: dec!(100),
            ask_size: dec!(100),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn buy_limit_price_crosses_toward_the_ask_by_the_aggressiveness_fraction() {
        let q = quote(dec!(100), dec!(100.10));
        let price = limit_price(&q, TradeAction::Buy, dec!(0.75), dec!(50)).unwrap();
        assert_eq!(price, dec!(100.075));
    }

    #[test]
    fn sell_limit_price_crosses_toward_the_bid_by_the_aggressiveness_fraction() {
        let q = quote(dec!(100), dec!(100.10));
        let price = limit_price(&q, TradeAction::Sell, dec!(0.85), dec!(50)).unwrap();
        assert_eq!(price, dec!(100.015));
    }

    #[test]
    fn a_wide_spread_falls_through_to_market_instead_of_pegging() {
        let q = quote(dec!(100), dec!(102));
        assert_eq!(limit_price(&q, TradeAction::Buy, dec!(0.75), dec!(50)), None);
    }

    #[test]
    fn quantity_floors_to_six_decimal_places() {
        assert_eq!(quantity_for_notional(dec!(1000), dec!(333.33)), dec!(3.000030));
    }

    #[test]
    fn a_near_full_exit_closes_the_position_instead_of_trading_a_computed_quantity() {
        assert!(should_close_position(TradeAction::Sell, dec!(99.5), dec!(100), dec!(0.01)));
        assert!(!should_close_position(TradeAction::Sell, dec!(50), dec!(100), dec!(0.01)));
        assert!(!should_close_position(TradeAction::Buy, dec!(99.5), dec!(100), dec!(0.01)));
    }

    #[test]
    fn fill_ratio_met_requires_at_least_the_minimum_fraction() {
        assert!(fill_ratio_met(dec!(99), dec!(100)));
        assert!(!fill_ratio_met(dec!(1), dec!(100)));
        assert!(fill_ratio_met(dec!(0), dec!(0)));
    }
}
