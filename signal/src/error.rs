use glidepath_core_types::Symbol;
use rust_decimal::Decimal;
use thiserror::Error;

/// A strategy's required indicators could not be computed, or too many
/// strategies failed for the stage to produce a usable consolidation.
#[derive(Debug, Error)]
pub enum SignalGenerationError {
    #[error("strategy {strategy_id} failed to evaluate: {reason}")]
    StrategyFailed { strategy_id: String, reason: String },

    #[error(
        "{failed} of {total} strategies failed; minimum required for a partial signal is {min_required}"
    )]
    InsufficientStrategies {
        failed: usize,
        total: usize,
        min_required: usize,
    },

    #[error("consolidated weights sum to {sum}, outside the [0, 1.01] tolerance")]
    ConsolidationOutOfTolerance { sum: Decimal },

    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailableError),
}

/// The market-data port was exhausted after retries.
#[derive(Debug, Error)]
pub enum DataUnavailableError {
    #[error("market data unavailable for {symbol} after {attempts} attempt(s): {reason}")]
    Exhausted {
        symbol: Symbol,
        attempts: u32,
        reason: String,
    },
}
