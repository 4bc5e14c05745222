use glidepath_broker::BrokerError;
use glidepath_config::ConfigError;
use glidepath_core_types::PlanInvariantViolation;
use glidepath_execution::ExecutionError;
use glidepath_portfolio::PlanningError;
use glidepath_runstate::RunStateError;
use glidepath_signal::SignalGenerationError;
use thiserror::Error;

/// Aggregates every stage error into one type for callers that just want
/// to log-and-exit (the CLI) rather than match on each stage's error
/// individually. Each variant still carries its stage's original error.
#[derive(Error, Debug)]
pub enum GlidepathError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("signal generation failed: {0}")]
    Signal(#[from] SignalGenerationError),

    #[error("rebalance plan is invalid: {0}")]
    Plan(#[from] PlanInvariantViolation),

    #[error("portfolio planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("run-state error: {0}")]
    RunState(#[from] RunStateError),

    /// Raised by CLI commands (`positions`, `cancel`) that talk to the
    /// broker directly, outside a full workflow invocation.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}
