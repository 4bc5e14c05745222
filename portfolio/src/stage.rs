use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use glidepath_broker::{Account, Position};
use glidepath_core_types::{
    CausationId, ConsolidatedPortfolio, CorrelationId, Phase, PlanId, Priority, RebalancePlan, RebalancePlanItem,
    RunId, Symbol, TradeAction, TradeDescriptor, TradeMessage,
};
use glidepath_runstate::RunStateStore;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::PlanningError;
use crate::limits::PortfolioLimits;

const CONSOLIDATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// The live account state the plan is computed against.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub account: Account,
    pub positions: Vec<Position>,
}

/// The plan, plus, in sharded mode, the per-trade envelopes and the
/// run_id the caller should look up for status.
#[derive(Debug, Clone)]
pub struct PortfolioStageOutput {
    pub plan: RebalancePlan,
    pub run_id: Option<RunId>,
    pub trade_messages: Option<Vec<TradeMessage>>,
}

#[derive(Debug, Clone, Copy)]
pub struct PortfolioStage {
    pub limits: PortfolioLimits,
    pub sharded_execution: bool,
}

impl PortfolioStage {
    pub fn new(limits: PortfolioLimits, sharded_execution: bool) -> Self {
        Self {
            limits,
            sharded_execution,
        }
    }

    /// Builds a [`RebalancePlan`] from the consolidated target weights and
    /// the live account snapshot. In sharded mode, also creates the run
    /// record (via `run_state`) and returns one [`TradeMessage`] per
    /// non-HOLD item.
    pub async fn run(
        &self,
        consolidated: &ConsolidatedPortfolio,
        snapshot: &AccountSnapshot,
        causation_id: CausationId,
        run_state: Option<&dyn RunStateStore>,
        now: DateTime<Utc>,
    ) -> Result<PortfolioStageOutput, PlanningError> {
        let weight_sum: Decimal = consolidated.weights.values().copied().sum();
        if (weight_sum - Decimal::ONE).abs() > CONSOLIDATION_TOLERANCE && !weight_sum.is_zero() {
            return Err(PlanningError::WeightsNotNormalized { sum: weight_sum });
        }

        let portfolio_value = snapshot.account.portfolio_value;
        let positions_by_symbol: BTreeMap<Symbol, &Position> =
            snapshot.positions.iter().map(|position| (position.symbol.clone(), position)).collect();

        let mut symbols: BTreeSet<Symbol> = consolidated.weights.keys().cloned().collect();
        symbols.extend(positions_by_symbol.keys().cloned());

        let mut items = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let current_value = positions_by_symbol.get(&symbol).map(|p| p.market_value).unwrap_or(Decimal::ZERO);
            let current_weight = if portfolio_value.is_zero() {
                Decimal::ZERO
            } else {
                current_value / portfolio_value
            };
            let target_weight = consolidated.weights.get(&symbol).copied().unwrap_or(Decimal::ZERO);
            let target_value = portfolio_value * target_weight;
            let weight_diff = target_weight - current_weight;
            let raw_trade_amount = target_value - current_value;

            let (action, trade_amount) = if raw_trade_amount.abs() < self.limits.min_trade_amount_usd {
                (TradeAction::Hold, Decimal::ZERO)
            } else if raw_trade_amount.is_sign_negative() {
                (TradeAction::Sell, raw_trade_amount)
            } else {
                (TradeAction::Buy, raw_trade_amount)
            };

            let priority = assign_priority(target_weight, current_value, weight_diff);

            items.push(RebalancePlanItem {
                symbol,
                current_weight,
                target_weight,
                weight_diff,
                current_value,
                target_value,
                trade_amount,
                action,
                priority,
            });
        }

        apply_deployable_capital_discipline(&mut items, snapshot.account.cash, portfolio_value, &self.limits);

        let total_trade_value: Decimal = items.iter().map(|item| item.trade_amount.abs()).sum();
        let plan = RebalancePlan::new(
            PlanId::new(),
            consolidated.correlation_id,
            causation_id,
            now,
            items,
            portfolio_value,
            total_trade_value,
            BTreeMap::new(),
            "1.0",
        )?;

        if !self.sharded_execution {
            return Ok(PortfolioStageOutput {
                plan,
                run_id: None,
                trade_messages: None,
            });
        }

        let run_id = RunId::new();
        let mut trade_messages: Vec<TradeMessage> = plan
            .non_hold_items()
            .map(|item| {
                let phase = match item.action {
                    TradeAction::Sell => Phase::Sell,
                    _ => Phase::Buy,
                };
                TradeMessage::new(
                    run_id,
                    glidepath_core_types::TradeId::new(),
                    plan.plan_id(),
                    plan.correlation_id(),
                    plan.causation_id(),
                    item.symbol.clone(),
                    item.action,
                    item.trade_amount,
                    phase,
                    item.priority,
                    plan.total_portfolio_value(),
                    plan.timestamp(),
                    BTreeMap::new(),
                )
            })
            .collect();
        trade_messages.sort_by_key(|message| message.sequence_number);

        if let Some(store) = run_state {
            let trades = trade_messages
                .iter()
                .map(|message| TradeDescriptor {
                    trade_id: message.trade_id,
                    symbol: message.symbol.clone(),
                    action: message.action,
                    phase: message.phase,
                })
                .collect();
            store.create_run(run_id, plan.plan_id(), plan.correlation_id(), trades).await?;
        }

        info!(%run_id, trades = trade_messages.len(), "sharded plan dispatched");
        Ok(PortfolioStageOutput {
            plan,
            run_id: Some(run_id),
            trade_messages: Some(trade_messages),
        })
    }
}

/// Highest priority (1) for a full exit, descending to 5 for the smallest
/// rebalances. `weight_diff` buckets were not specified by the source
/// contract (an open question, resolved here rather than left undecided);
/// tie-breaking by symbol falls out of iterating a `BTreeSet` in the caller.
fn assign_priority(target_weight: Decimal, current_value: Decimal, weight_diff: Decimal) -> Priority {
    if target_weight.is_zero() && current_value > Decimal::ZERO {
        return Priority::HIGHEST;
    }
    let magnitude = weight_diff.abs();
    let level = if magnitude >= Decimal::new(15, 2) {
        2
    } else if magnitude >= Decimal::new(8, 2) {
        3
    } else if magnitude >= Decimal::new(3, 2) {
        4
    } else {
        5
    };
    Priority::new(level).expect("level is always in [2, 5]")
}

/// `Σ trade_amount(BUY) ≤ cash + Σ|trade_amount(SELL)| − cash_reserve`. If
/// violated, scales every BUY amount down proportionally so the ceiling
/// holds exactly.
fn apply_deployable_capital_discipline(
    items: &mut [RebalancePlanItem],
    cash: Decimal,
    portfolio_value: Decimal,
    limits: &PortfolioLimits,
) {
    let sell_proceeds: Decimal = items
        .iter()
        .filter(|item| item.action == TradeAction::Sell)
        .map(|item| item.trade_amount.abs())
        .sum();
    let buy_total: Decimal = items
        .iter()
        .filter(|item| item.action == TradeAction::Buy)
        .map(|item| item.trade_amount)
        .sum();
    if buy_total.is_zero() {
        return;
    }

    let cash_reserve = limits.cash_reserve(portfolio_value);
    let available = (cash + sell_proceeds - cash_reserve).max(Decimal::ZERO);
    if buy_total <= available {
        return;
    }

    let scale = available / buy_total;
    warn!(%scale, %buy_total, %available, "scaling down BUY amounts to respect deployable-capital discipline");
    for item in items.iter_mut().filter(|item| item.action == TradeAction::Buy) {
        item.trade_amount *= scale;
        item.target_value = item.current_value + item.trade_amount;
    }
}
