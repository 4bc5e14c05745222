//! The three message types that cross stage boundaries, plus the two
//! completion-output events, exactly as specified in the external
//! interfaces surface.

use chrono::{DateTime, Utc};
use glidepath_core_types::{ConsolidatedPortfolio, CorrelationId, RebalancePlan, RunId, RunStatus, TradeMessage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stage-crossing event. Every variant carries `correlation_id` (the
/// workflow-spanning identifier) and is wrapped at publish time in an
/// [`Envelope`] that additionally records `causation_id` and the
/// ordering key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    SignalGenerated {
        consolidated_portfolio: ConsolidatedPortfolio,
        timestamp: DateTime<Utc>,
        schema_version: String,
    },
    /// Batched mode only.
    RebalancePlanned {
        rebalance_plan: RebalancePlan,
        timestamp: DateTime<Utc>,
        schema_version: String,
    },
    /// Sharded mode only. Published with `message_group_id = run_id`,
    /// `deduplication_id = trade_id`.
    TradeDispatched {
        trade_message: TradeMessage,
        schema_version: String,
    },
    WorkflowCompleted {
        run_id: RunId,
        status: RunStatus,
        succeeded_trades: u32,
        failed_trades: u32,
        total_traded_value: Decimal,
        duration_ms: u64,
    },
    WorkflowFailed(WorkflowFailed),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFailed {
    pub run_id: Option<RunId>,
    pub error_kind: String,
    pub error_message: String,
    pub failed_stage: String,
}

/// The envelope every [`WorkflowEvent`] travels in. `causation_id` is the
/// id of the message that produced this one, forming a chain back to the
/// workflow root; `message_group_id` is the ordering key a bus
/// implementation partitions on (always `run_id` for trade messages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub correlation_id: CorrelationId,
    pub causation_id: glidepath_core_types::CausationId,
    pub message_group_id: String,
    pub deduplication_id: Option<String>,
    pub event: WorkflowEvent,
}

impl Envelope {
    pub fn new(
        correlation_id: CorrelationId,
        causation_id: glidepath_core_types::CausationId,
        message_group_id: impl Into<String>,
        event: WorkflowEvent,
    ) -> Self {
        Self {
            correlation_id,
            causation_id,
            message_group_id: message_group_id.into(),
            deduplication_id: None,
            event,
        }
    }

    pub fn with_deduplication_id(mut self, id: impl Into<String>) -> Self {
        self.deduplication_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core_types::CausationId;

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = Envelope::new(
            CorrelationId::new(),
            CausationId::new(),
            "run-group",
            WorkflowEvent::WorkflowFailed(WorkflowFailed {
                run_id: None,
                error_kind: "PlanningError".into(),
                error_message: "weights did not sum to 1.0".into(),
                failed_stage: "portfolio".into(),
            }),
        );
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.message_group_id, "run-group");
    }
}
