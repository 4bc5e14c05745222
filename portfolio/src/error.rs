use glidepath_core_types::PlanInvariantViolation;
use rust_decimal::Decimal;
use thiserror::Error;

/// A rebalance plan violated one of its construction invariants, or the
/// consolidated portfolio handed to this stage was itself malformed.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error(transparent)]
    Invariant(#[from] PlanInvariantViolation),

    #[error("consolidated portfolio weights sum to {sum}, expected ~1.0")]
    WeightsNotNormalized { sum: Decimal },

    #[error("failed to initialize run record: {0}")]
    RunStateInitFailed(#[from] glidepath_runstate::RunStateError),
}

/// Current positions or portfolio value could not be fetched.
#[derive(Debug, Error)]
pub enum InsufficientDataError {
    #[error("account snapshot unavailable: {reason}")]
    AccountUnavailable { reason: String },
}
