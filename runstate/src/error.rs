use glidepath_core_types::{RunId, TradeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunStateError {
    #[error("run {0} not found")]
    RunNotFound(RunId),

    #[error("trade {trade_id} not found in run {run_id}")]
    TradeNotFound { run_id: RunId, trade_id: TradeId },

    #[error(transparent)]
    Gating(#[from] glidepath_risk::GatingError),

    #[error("run-state CAS conflict on run {0} after exhausting retry budget")]
    CasConflict(RunId),
}
