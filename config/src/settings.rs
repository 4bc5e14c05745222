use std::collections::HashMap;
use std::time::Duration;

use glidepath_execution::ExecutionParams;
use glidepath_portfolio::PortfolioLimits;
use glidepath_risk::GatingLimits;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ConfigError;

/// Which broker adapter a run talks to. Only [`Mode::Paper`] has an
/// implementation in this workspace, the real broker wire protocol is
/// out of scope (spec.md §1's explicit non-goal). `Mode::Live` is still a
/// recognized config value so a deployment manifest can name the intended
/// target; wiring it to an adapter is left to the binary that embeds this
/// crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Paper,
    Live,
}

/// The full operator-recognized configuration surface (spec.md §6), plus
/// `min_cash_reserve_usd`, which [`PortfolioLimits`] needs but the
/// distilled spec's option list omits, kept as a config field rather
/// than a hardcoded constant since it's the same kind of operator-tunable
/// floor as everything else here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mode: Mode,
    pub sharded_execution: bool,

    pub min_trade_amount_usd: Decimal,
    pub min_cash_reserve_usd: Decimal,
    pub cash_reserve_pct: Decimal,
    pub max_single_order_usd: Decimal,
    pub max_daily_trade_value_usd: Decimal,

    pub buy_timeout_seconds: u64,
    pub sell_timeout_seconds: u64,
    pub max_repegs_per_order: u32,
    pub repeg_interval_seconds: u64,
    pub peg_aggressiveness_buy: Decimal,
    pub peg_aggressiveness_sell: Decimal,
    pub quote_max_staleness_seconds: u64,
    pub spread_wide_bps: Decimal,
    pub settlement_timeout_seconds: u64,

    pub allowed_strategies: Vec<String>,
    pub strategy_allocations: HashMap<String, Decimal>,
}

impl Default for Config {
    /// Defaults match spec.md §6 and `ExecutionParams::default`'s
    /// reference values exactly.
    fn default() -> Self {
        Self {
            mode: Mode::Paper,
            sharded_execution: false,
            min_trade_amount_usd: Decimal::new(5, 0),
            min_cash_reserve_usd: Decimal::new(1000, 0),
            cash_reserve_pct: Decimal::new(1, 2),
            max_single_order_usd: Decimal::new(100_000, 0),
            max_daily_trade_value_usd: Decimal::new(500_000, 0),
            buy_timeout_seconds: 15,
            sell_timeout_seconds: 10,
            max_repegs_per_order: 5,
            repeg_interval_seconds: 3,
            peg_aggressiveness_buy: Decimal::new(75, 2),
            peg_aggressiveness_sell: Decimal::new(85, 2),
            quote_max_staleness_seconds: 2,
            spread_wide_bps: Decimal::new(50, 0),
            settlement_timeout_seconds: 30,
            allowed_strategies: Vec::new(),
            strategy_allocations: HashMap::new(),
        }
    }
}

impl Config {
    /// Rejects values that would let later stages silently misbehave
    /// rather than fail fast at startup, the only place a
    /// `ConfigurationError` is allowed to originate, per spec.md §7.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_interval = |value: Decimal, name: &str| -> Result<(), ConfigError> {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::validation(format!("{name} must be within [0, 1], got {value}")));
            }
            Ok(())
        };
        unit_interval(self.cash_reserve_pct, "cash_reserve_pct")?;
        unit_interval(self.peg_aggressiveness_buy, "peg_aggressiveness_buy")?;
        unit_interval(self.peg_aggressiveness_sell, "peg_aggressiveness_sell")?;

        if self.min_trade_amount_usd < Decimal::ZERO {
            return Err(ConfigError::validation("min_trade_amount_usd must be non-negative"));
        }
        if self.max_single_order_usd <= Decimal::ZERO {
            return Err(ConfigError::validation("max_single_order_usd must be positive"));
        }
        if self.max_daily_trade_value_usd < self.max_single_order_usd {
            return Err(ConfigError::validation(
                "max_daily_trade_value_usd must be at least max_single_order_usd, or every run would be capped below a single order",
            ));
        }
        if self.max_repegs_per_order == 0 {
            return Err(ConfigError::validation("max_repegs_per_order must be at least 1"));
        }
        if self.spread_wide_bps < Decimal::ZERO {
            return Err(ConfigError::validation("spread_wide_bps must be non-negative"));
        }
        for name in &self.allowed_strategies {
            if !self.strategy_allocations.contains_key(name) {
                return Err(ConfigError::validation(format!(
                    "allowed_strategies names '{name}', which has no entry in strategy_allocations"
                )));
            }
        }
        for (name, share) in &self.strategy_allocations {
            if *share < Decimal::ZERO || *share > Decimal::ONE {
                return Err(ConfigError::validation(format!(
                    "strategy_allocations['{name}'] must be within [0, 1], got {share}"
                )));
            }
        }
        Ok(())
    }

    pub fn gating_limits(&self) -> GatingLimits {
        GatingLimits {
            min_trade_amount_usd: self.min_trade_amount_usd,
            max_single_order_usd: self.max_single_order_usd,
            max_daily_trade_value_usd: self.max_daily_trade_value_usd,
        }
    }

    pub fn portfolio_limits(&self) -> PortfolioLimits {
        PortfolioLimits {
            min_trade_amount_usd: self.min_trade_amount_usd,
            min_cash_reserve_usd: self.min_cash_reserve_usd,
            cash_reserve_pct: self.cash_reserve_pct,
        }
    }

    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams {
            peg_aggressiveness_buy: self.peg_aggressiveness_buy,
            peg_aggressiveness_sell: self.peg_aggressiveness_sell,
            buy_timeout: Duration::from_secs(self.buy_timeout_seconds),
            sell_timeout: Duration::from_secs(self.sell_timeout_seconds),
            max_repegs: self.max_repegs_per_order,
            repeg_interval: Duration::from_secs(self.repeg_interval_seconds),
            quote_max_staleness: Duration::from_secs(self.quote_max_staleness_seconds),
            spread_wide_bps: self.spread_wide_bps,
            settlement_timeout: Duration::from_secs(self.settlement_timeout_seconds),
            bypass_market_hours: self.mode == Mode::Paper,
            ..ExecutionParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn a_daily_limit_below_the_single_order_cap_is_rejected() {
        let mut config = Config::default();
        config.max_daily_trade_value_usd = config.max_single_order_usd - Decimal::ONE;
        assert!(config.validate().is_err());
    }

    #[test]
    fn an_allowed_strategy_with_no_allocation_entry_is_rejected() {
        let mut config = Config::default();
        config.allowed_strategies.push("momentum".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn conversions_carry_the_configured_values_through() {
        let config = Config::default();
        assert_eq!(config.gating_limits().max_single_order_usd, config.max_single_order_usd);
        assert_eq!(config.portfolio_limits().cash_reserve_pct, config.cash_reserve_pct);
        assert_eq!(config.execution_params().max_repegs, config.max_repegs_per_order);
    }
}
