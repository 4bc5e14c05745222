use rust_decimal::Decimal;

/// The configured thresholds the Portfolio Stage's algorithm depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortfolioLimits {
    pub min_trade_amount_usd: Decimal,
    pub min_cash_reserve_usd: Decimal,
    pub cash_reserve_pct: Decimal,
}

impl PortfolioLimits {
    pub fn cash_reserve(&self, portfolio_value: Decimal) -> Decimal {
        (self.cash_reserve_pct * portfolio_value).max(self.min_cash_reserve_usd)
    }
}
