//! An in-process event bus: at-least-once delivery via explicit ack/nack,
//! ordering preserved per `message_group_id`.
//!
//! A single global FIFO queue trivially satisfies "ordered per group" (any
//! subsequence of a totally-ordered sequence is itself ordered), which is
//! sufficient for the single-host deployments this implementation targets.
//! A distributed adapter (SQS FIFO, Kafka with keyed partitions, ...) would
//! implement the same [`EventBus`] trait with per-key partitioning instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::error::EventBusError;
use crate::message::Envelope;

/// The event bus abstraction consumed by every stage. Implementations must
/// provide at-least-once delivery and preserve ordering among messages
/// sharing a `message_group_id`.
#[async_trait::async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, envelope: Envelope) -> Result<(), EventBusError>;

    /// Blocks until a message is available or `timeout` elapses.
    async fn receive(&self, timeout: Duration) -> Result<Option<Delivery>, EventBusError>;
}

/// A received envelope paired with the ack/nack handle for it. Dropping a
/// `Delivery` without acking is equivalent to a `nack`, the message is
/// redelivered, matching at-least-once semantics.
#[derive(Debug)]
pub struct Delivery {
    pub envelope: Envelope,
    acked: bool,
    requeue: mpsc::UnboundedSender<Envelope>,
    pending: Option<Envelope>,
}

impl Delivery {
    fn new(envelope: Envelope, requeue: mpsc::UnboundedSender<Envelope>) -> Self {
        Self {
            envelope: envelope.clone(),
            acked: false,
            requeue,
            pending: Some(envelope),
        }
    }

    /// Confirms successful processing; the message will not be redelivered.
    pub fn ack(mut self) {
        self.acked = true;
        self.pending = None;
    }

    /// Explicitly requests redelivery (e.g. a transient broker error was
    /// hit downstream). Equivalent to letting the `Delivery` drop unacked.
    pub fn nack(mut self) {
        self.acked = false;
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if !self.acked {
            if let Some(envelope) = self.pending.take() {
                let _ = self.requeue.send(envelope);
            }
        }
    }
}

/// The default in-process [`EventBus`] implementation, backed by an
/// unbounded `tokio::sync::mpsc` channel.
pub struct OrderedBus {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>>,
}

impl std::fmt::Debug for OrderedBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedBus").finish_non_exhaustive()
    }
}

impl OrderedBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }
}

impl Default for OrderedBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventBus for OrderedBus {
    async fn publish(&self, envelope: Envelope) -> Result<(), EventBusError> {
        tracing::debug!(
            correlation_id = %envelope.correlation_id,
            message_group_id = %envelope.message_group_id,
            "publishing event"
        );
        self.sender.send(envelope).map_err(|_| EventBusError::ReceiverDropped)
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<Delivery>, EventBusError> {
        let mut receiver = self.receiver.lock().await;
        match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Some(envelope)) => Ok(Some(Delivery::new(envelope, self.sender.clone()))),
            Ok(None) => Err(EventBusError::ReceiverDropped),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glidepath_core_types::{CausationId, CorrelationId};

    use super::*;
    use crate::message::{WorkflowEvent, WorkflowFailed};

    fn sample_envelope(group: &str) -> Envelope {
        Envelope::new(
            CorrelationId::new(),
            CausationId::new(),
            group,
            WorkflowEvent::WorkflowFailed(WorkflowFailed {
                run_id: None,
                error_kind: "Test".into(),
                error_message: "test".into(),
                failed_stage: "test".into(),
            }),
        )
    }

    #[tokio::test]
    async fn messages_in_the_same_group_are_delivered_in_publish_order() {
        let bus = OrderedBus::new();
        bus.publish(sample_envelope("run-1").with_deduplication_id("a"))
            .await
            .unwrap();
        bus.publish(sample_envelope("run-1").with_deduplication_id("b"))
            .await
            .unwrap();

        let first = bus.receive(Duration::from_millis(100)).await.unwrap().unwrap();
        assert_eq!(first.envelope.deduplication_id.as_deref(), Some("a"));
        first.ack();

        let second = bus.receive(Duration::from_millis(100)).await.unwrap().unwrap();
        assert_eq!(second.envelope.deduplication_id.as_deref(), Some("b"));
        second.ack();
    }

    #[tokio::test]
    async fn unacked_delivery_is_redelivered() {
        let bus = OrderedBus::new();
        bus.publish(sample_envelope("run-1")).await.unwrap();

        let delivery = bus.receive(Duration::from_millis(100)).await.unwrap().unwrap();
        delivery.nack();

        let redelivered = bus.receive(Duration::from_millis(100)).await.unwrap();
        assert!(redelivered.is_some());
    }

    #[tokio::test]
    async fn receive_times_out_when_empty() {
        let bus = OrderedBus::new();
        let result = bus.receive(Duration::from_millis(10)).await.unwrap();
        assert!(result.is_none());
    }
}
