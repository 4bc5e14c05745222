#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # Glidepath
//!
//! The facade that wires every stage crate into one runnable workflow:
//! [`workflow::Workflow`] runs Signal → Portfolio → Execution end to end
//! and appends a ledger row per trade, [`market_data::BrokerMarketData`]
//! is the one production [`glidepath_signal::MarketDataPort`] in the
//! workspace, and [`error::GlidepathError`] aggregates every stage's error
//! type for callers that just want to log-and-exit.
//!
//! This crate also owns the two ambient concerns every binary built on
//! this workspace needs and that no stage crate should: [`logging`] setup
//! and [`shutdown`] signal handling.

pub mod error;
pub mod logging;
pub mod market_data;
pub mod shutdown;
pub mod workflow;

pub use error::GlidepathError;
pub use market_data::BrokerMarketData;
pub use shutdown::{wait_for_signal, Shutdown};
pub use workflow::{TradeResult, Workflow, WorkflowOutcome};

/// Re-exports of every stage crate's public surface, for a binary that
/// wants one `use glidepath::prelude::*;` rather than naming each
/// `glidepath-*` crate individually.
pub mod prelude {
    pub use glidepath_analytics::{render_run_summary, run_summary, RunSummary, StrategyBreakdown, SuccessRate};
    pub use glidepath_broker::{Account, BrokerClient, PaperBrokerClient, Position, TradeUpdateRouter};
    pub use glidepath_config::{load_config, load_config_from, Config, ConfigError, Mode};
    pub use glidepath_core_types::{
        CausationId, CorrelationId, ExecutedOrder, ExecutionRunRecord, OrderId, PlanId, RebalancePlan, RunId,
        RunStatus, Symbol, TradeAction, TradeId, TradeLedgerEntry, TradeMessage, TradeStatus,
    };
    pub use glidepath_events::{EventBus, OrderedBus};
    pub use glidepath_execution::{ExecutionOutcome, ExecutionParams, TradeExecutor};
    pub use glidepath_portfolio::{AccountSnapshot, PortfolioStage, PortfolioStageOutput};
    pub use glidepath_quotes::QuoteCache;
    pub use glidepath_risk::GatingLimits;
    pub use glidepath_runstate::{InMemoryLedgerSink, InMemoryRunStateStore, LedgerSink, RunStateStore};
    pub use glidepath_signal::{MarketDataPort, SignalStage, StrategyEvaluator, WeightedStrategy};
    pub use glidepath_strategies::{EqualWeightStrategy, MomentumRankedStrategy};

    pub use crate::{market_data::BrokerMarketData, shutdown::wait_for_signal, GlidepathError, Workflow, WorkflowOutcome};
}
