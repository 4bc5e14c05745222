use thiserror::Error;

/// Errors raised by an [`crate::EventBus`] implementation.
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("message group channel for key '{group_key}' is closed")]
    GroupChannelClosed { group_key: String },

    #[error("event bus receiver was dropped")]
    ReceiverDropped,

    #[error("failed to serialize event payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("publish timed out after {0:?}")]
    PublishTimeout(std::time::Duration),
}
