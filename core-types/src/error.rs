//! Cross-cutting error context.
//!
//! `spec.md`'s Design Notes flagged "multiple conflicting error-context
//! schemas" in the source material; this crate settles on exactly one,
//! attached to library errors at the point they're raised rather than
//! reconstructed from thread-locals further up the stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{CausationId, CorrelationId};

/// Structured context attached to an error at the crate boundary that
/// raised it. `additional_data` carries whatever a handler thinks is worth
/// recording (symbol, order id, attempt count, ...) without every error
/// variant needing its own bespoke field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub correlation_id: CorrelationId,
    pub causation_id: CausationId,
    pub operation: String,
    pub component: String,
    pub additional_data: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new(
        correlation_id: CorrelationId,
        causation_id: CausationId,
        component: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id,
            causation_id,
            operation: operation.into(),
            component: component.into(),
            additional_data: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.additional_data.insert(key.into(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_additional_data() {
        let ctx = ErrorContext::new(
            CorrelationId::new(),
            CausationId::new(),
            "glidepath-execution",
            "submit_limit_order",
        )
        .with("symbol", "AAPL")
        .with("attempt_count", 2);

        assert_eq!(ctx.additional_data.get("symbol").unwrap(), "AAPL");
        assert_eq!(ctx.additional_data.get("attempt_count").unwrap(), "2");
    }
}
