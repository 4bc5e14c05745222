//! The Portfolio Stage's output: a rebalance plan and the per-symbol items
//! that compose it.

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CausationId, CorrelationId, PlanId};
use crate::symbol::Symbol;

/// What to do about one symbol's weight gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// Execution priority, `1` (most urgent, full exits) through `5`
/// (smallest rebalances). Bounded at construction so an out-of-range value
/// can never leak into a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("priority {0} out of range [1, 5]")]
pub struct PriorityOutOfRange(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(5);

    pub fn new(value: u8) -> Result<Self, PriorityOutOfRange> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PriorityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = PriorityOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

/// One row of a rebalance plan: the planned action for a single symbol.
///
/// `trade_amount` is signed: positive for BUY, negative for SELL, zero for
/// HOLD. An item whose `|trade_amount|` falls below the configured dust
/// threshold is demoted to HOLD by the planner before the item is
/// constructed, this type does not re-derive `action` from `trade_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlanItem {
    pub symbol: Symbol,
    pub current_weight: Decimal,
    pub target_weight: Decimal,
    pub weight_diff: Decimal,
    pub current_value: Decimal,
    pub target_value: Decimal,
    pub trade_amount: Decimal,
    pub action: TradeAction,
    pub priority: Priority,
}

impl RebalancePlanItem {
    pub fn is_hold(&self) -> bool {
        matches!(self.action, TradeAction::Hold)
    }
}

/// An immutable, fully-computed rebalance plan.
///
/// Invariants enforced by [`RebalancePlan::new`]: every item's target
/// weight is non-negative; target weights sum to at most `1 + 0.01`;
/// `total_trade_value` equals the sum of absolute trade amounts; the plan
/// holds at least one item. Once built there is no setter, "immutable
/// after construction" per the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlan {
    plan_id: PlanId,
    correlation_id: CorrelationId,
    causation_id: CausationId,
    timestamp: DateTime<Utc>,
    items: Vec<RebalancePlanItem>,
    total_portfolio_value: Decimal,
    total_trade_value: Decimal,
    metadata: std::collections::BTreeMap<String, String>,
    schema_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanInvariantViolation {
    #[error("rebalance plan must contain at least one item")]
    Empty,
    #[error("item {symbol} has negative target weight {weight}")]
    NegativeTargetWeight { symbol: Symbol, weight: Decimal },
    #[error("target weights sum to {sum}, exceeding the 1.01 ceiling")]
    TargetWeightsExceedCeiling { sum: Decimal },
    #[error("total_trade_value {declared} does not match computed sum of absolute trade amounts {computed}")]
    TotalTradeValueMismatch { declared: Decimal, computed: Decimal },
}

const TARGET_WEIGHT_CEILING: &str = "1.01";

impl RebalancePlan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plan_id: PlanId,
        correlation_id: CorrelationId,
        causation_id: CausationId,
        timestamp: DateTime<Utc>,
        items: Vec<RebalancePlanItem>,
        total_portfolio_value: Decimal,
        total_trade_value: Decimal,
        metadata: std::collections::BTreeMap<String, String>,
        schema_version: impl Into<String>,
    ) -> Result<Self, PlanInvariantViolation> {
        if items.is_empty() {
            return Err(PlanInvariantViolation::Empty);
        }
        let mut weight_sum = Decimal::ZERO;
        for item in &items {
            if item.target_weight.is_sign_negative() && !item.target_weight.is_zero() {
                return Err(PlanInvariantViolation::NegativeTargetWeight {
                    symbol: item.symbol.clone(),
                    weight: item.target_weight,
                });
            }
            weight_sum += item.target_weight;
        }
        let ceiling: Decimal = TARGET_WEIGHT_CEILING.parse().expect("valid decimal literal");
        if weight_sum > ceiling {
            return Err(PlanInvariantViolation::TargetWeightsExceedCeiling { sum: weight_sum });
        }
        let computed_trade_value: Decimal = items.iter().map(|item| item.trade_amount.abs()).sum();
        if computed_trade_value != total_trade_value {
            return Err(PlanInvariantViolation::TotalTradeValueMismatch {
                declared: total_trade_value,
                computed: computed_trade_value,
            });
        }

        Ok(Self {
            plan_id,
            correlation_id,
            causation_id,
            timestamp,
            items,
            total_portfolio_value,
            total_trade_value,
            metadata,
            schema_version: schema_version.into(),
        })
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn causation_id(&self) -> CausationId {
        self.causation_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn items(&self) -> &[RebalancePlanItem] {
        &self.items
    }

    pub fn non_hold_items(&self) -> impl Iterator<Item = &RebalancePlanItem> {
        self.items.iter().filter(|item| !item.is_hold())
    }

    pub fn total_portfolio_value(&self) -> Decimal {
        self.total_portfolio_value
    }

    pub fn total_trade_value(&self) -> Decimal {
        self.total_trade_value
    }

    pub fn metadata(&self) -> &std::collections::BTreeMap<String, String> {
        &self.metadata
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn item(symbol_str: &str, target_weight: Decimal, trade_amount: Decimal, action: TradeAction) -> RebalancePlanItem {
        RebalancePlanItem {
            symbol: symbol(symbol_str),
            current_weight: dec!(0),
            target_weight,
            weight_diff: target_weight,
            current_value: dec!(0),
            target_value: trade_amount,
            trade_amount,
            action,
            priority: Priority::new(2).unwrap(),
        }
    }

    #[test]
    fn rejects_empty_plan() {
        let err = RebalancePlan::new(
            PlanId::new(),
            CorrelationId::new(),
            CausationId::new(),
            Utc::now(),
            vec![],
            dec!(0),
            dec!(0),
            Default::default(),
            "1.0",
        )
        .unwrap_err();
        assert_eq!(err, PlanInvariantViolation::Empty);
    }

    #[test]
    fn rejects_mismatched_total_trade_value() {
        let items = vec![item("AAPL", dec!(0.3), dec!(-20000), TradeAction::Sell)];
        let err = RebalancePlan::new(
            PlanId::new(),
            CorrelationId::new(),
            CausationId::new(),
            Utc::now(),
            items,
            dec!(100000),
            dec!(999),
            Default::default(),
            "1.0",
        )
        .unwrap_err();
        assert!(matches!(err, PlanInvariantViolation::TotalTradeValueMismatch { .. }));
    }

    #[test]
    fn accepts_well_formed_plan_and_exposes_non_hold_items() {
        let items = vec![
            item("AAPL", dec!(0.3), dec!(-20000), TradeAction::Sell),
            item("MSFT", dec!(0.7), dec!(70000), TradeAction::Buy),
            item("TSLA", dec!(0), dec!(0), TradeAction::Hold),
        ];
        let plan = RebalancePlan::new(
            PlanId::new(),
            CorrelationId::new(),
            CausationId::new(),
            Utc::now(),
            items,
            dec!(100000),
            dec!(90000),
            Default::default(),
            "1.0",
        )
        .unwrap();
        assert_eq!(plan.non_hold_items().count(), 2);
    }

    #[test]
    fn priority_rejects_out_of_range_values() {
        assert!(Priority::new(0).is_err());
        assert!(Priority::new(6).is_err());
        assert!(Priority::new(1).is_ok());
        assert!(Priority::new(5).is_ok());
    }
}
