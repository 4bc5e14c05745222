//! The individual gate predicates, applied in the order specified for
//! pre-trade gating: structural validation, then order-size, then the
//! daily-limit gate, then market hours.

use glidepath_core_types::{Symbol, TradeAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The configured thresholds every gate is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingLimits {
    pub min_trade_amount_usd: Decimal,
    pub max_single_order_usd: Decimal,
    pub max_daily_trade_value_usd: Decimal,
}

/// The run-level or trade-level policy failures a pre-trade gate can
/// raise. A trade failing any of these is marked FAILED; whether the run
/// continues or halts depends on the subtype, per the retry table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatingError {
    #[error("{symbol}: trade amount {trade_amount} or action is structurally invalid: {reason}")]
    Structural {
        symbol: Symbol,
        trade_amount: Decimal,
        reason: String,
    },

    #[error("{symbol}: order notional {notional} exceeds max_single_order_usd {limit}")]
    OrderTooLarge { symbol: Symbol, notional: Decimal, limit: Decimal },

    #[error("day_traded_value {current} + |{trade_amount}| would exceed max_daily_trade_value_usd {limit}")]
    DailyLimitExceeded {
        current: Decimal,
        trade_amount: Decimal,
        limit: Decimal,
    },

    #[error("market is closed for {symbol}")]
    MarketClosed { symbol: Symbol },
}

/// Symbol non-empty (enforced by `Symbol` construction already), action in
/// `{BUY, SELL}` (HOLD items never reach execution), and
/// `|trade_amount| >= min_trade_amount_usd`.
pub fn structural_validation_check(
    symbol: &Symbol,
    action: TradeAction,
    trade_amount: Decimal,
    limits: &GatingLimits,
) -> Result<(), GatingError> {
    if matches!(action, TradeAction::Hold) {
        return Err(GatingError::Structural {
            symbol: symbol.clone(),
            trade_amount,
            reason: "HOLD items must not reach execution".to_string(),
        });
    }
    if trade_amount.abs() < limits.min_trade_amount_usd {
        return Err(GatingError::Structural {
            symbol: symbol.clone(),
            trade_amount,
            reason: format!("|trade_amount| below min_trade_amount_usd {}", limits.min_trade_amount_usd),
        });
    }
    Ok(())
}

/// Order notional must not exceed `MAX_SINGLE_ORDER_USD`.
pub fn order_size_check(symbol: &Symbol, trade_amount: Decimal, limits: &GatingLimits) -> Result<(), GatingError> {
    let notional = trade_amount.abs();
    if notional > limits.max_single_order_usd {
        return Err(GatingError::OrderTooLarge {
            symbol: symbol.clone(),
            notional,
            limit: limits.max_single_order_usd,
        });
    }
    Ok(())
}

/// Pure predicate for the daily cumulative-value gate: `day_traded_value +
/// |trade_amount| <= max_daily_trade_value_usd` admits the trade
/// (inclusive boundary). The atomic compare-and-update against the run
/// record's live `day_traded_value` happens in `glidepath-runstate`; this
/// function is the policy the CAS loop there evaluates.
pub fn daily_limit_check(
    day_traded_value: Decimal,
    trade_amount: Decimal,
    limits: &GatingLimits,
) -> Result<(), GatingError> {
    let projected = day_traded_value + trade_amount.abs();
    if projected > limits.max_daily_trade_value_usd {
        return Err(GatingError::DailyLimitExceeded {
            current: day_traded_value,
            trade_amount,
            limit: limits.max_daily_trade_value_usd,
        });
    }
    Ok(())
}

/// Unless bypassed by configuration, the order must not be placed while
/// the market is closed.
pub fn market_hours_check(symbol: &Symbol, market_is_open: bool, bypass: bool) -> Result<(), GatingError> {
    if !bypass && !market_is_open {
        return Err(GatingError::MarketClosed { symbol: symbol.clone() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn limits() -> GatingLimits {
        GatingLimits {
            min_trade_amount_usd: dec!(5),
            max_single_order_usd: dec!(100000),
            max_daily_trade_value_usd: dec!(500000),
        }
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[test]
    fn structural_check_rejects_amount_below_min_trade() {
        let err = structural_validation_check(&symbol("AAPL"), TradeAction::Buy, dec!(4.99), &limits()).unwrap_err();
        assert!(matches!(err, GatingError::Structural { .. }));
    }

    #[test]
    fn structural_check_accepts_amount_at_min_trade_boundary() {
        // MIN_TRADE_AMOUNT itself is defined as a HOLD boundary by the planner,
        // so values that reach here are expected to be strictly >= min; at
        // exactly min the structural gate still admits it.
        assert!(structural_validation_check(&symbol("AAPL"), TradeAction::Sell, dec!(-5), &limits()).is_ok());
    }

    #[test]
    fn order_size_check_rejects_above_max_single_order() {
        let err = order_size_check(&symbol("AAPL"), dec!(100000.01), &limits()).unwrap_err();
        assert!(matches!(err, GatingError::OrderTooLarge { .. }));
    }

    #[test]
    fn daily_limit_admits_exactly_at_the_ceiling() {
        assert!(daily_limit_check(dec!(350000), dec!(150000), &limits()).is_ok());
    }

    #[test]
    fn daily_limit_rejects_one_cent_over_the_ceiling() {
        let err = daily_limit_check(dec!(350000.01), dec!(150000), &limits()).unwrap_err();
        assert!(matches!(err, GatingError::DailyLimitExceeded { .. }));
    }

    #[test]
    fn market_hours_check_respects_bypass() {
        assert!(market_hours_check(&symbol("AAPL"), false, true).is_ok());
        assert!(market_hours_check(&symbol("AAPL"), false, false).is_err());
        assert!(market_hours_check(&symbol("AAPL"), true, false).is_ok());
    }
}
