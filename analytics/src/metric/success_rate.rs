use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction of trades that reached [`TradeStatus::Completed`] out of all
/// trades that reached a terminal state, as `completed/(completed+failed)`.
///
/// [`TradeStatus::Completed`]: glidepath_core_types::TradeStatus::Completed
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SuccessRate {
    pub value: Decimal,
}

impl SuccessRate {
    /// Returns `None` when no trade has reached a terminal state yet.
    pub fn calculate(completed: Decimal, terminal: Decimal) -> Option<Self> {
        if terminal.is_zero() {
            None
        } else {
            let value = completed.abs().checked_div(terminal.abs())?;
            Some(Self { value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn no_terminal_trades_yields_none() {
        assert_eq!(SuccessRate::calculate(Decimal::ZERO, Decimal::ZERO), None);
    }

    #[test]
    fn all_completed_is_one() {
        assert_eq!(SuccessRate::calculate(dec!(4), dec!(4)).unwrap().value, Decimal::ONE);
    }

    #[test]
    fn partial_completion() {
        assert_eq!(SuccessRate::calculate(dec!(3), dec!(4)).unwrap().value, dec!(0.75));
    }
}
