//! A trait abstraction over different channel kinds, so bus internals and
//! call sites don't need to know whether they're holding a bounded or
//! unbounded `tokio::mpsc` sender.

use tokio::sync::mpsc;

use crate::error::EventBusError;

/// A sender half that can have an item pushed onto it without the caller
/// caring whether the underlying channel is bounded or unbounded.
pub trait Tx<T>: Send + Sync {
    fn send(&self, item: T) -> Result<(), EventBusError>;
}

/// Wraps `tokio::sync::mpsc::UnboundedSender`, used for the per-trade
/// trade-update routing channels established by the broker adapter.
#[derive(Debug, Clone)]
pub struct UnboundedTx<T>(mpsc::UnboundedSender<T>);

impl<T> UnboundedTx<T> {
    pub fn new(sender: mpsc::UnboundedSender<T>) -> Self {
        Self(sender)
    }
}

impl<T: Send + Sync> Tx<T> for UnboundedTx<T> {
    fn send(&self, item: T) -> Result<(), EventBusError> {
        self.0.send(item).map_err(|_| EventBusError::ReceiverDropped)
    }
}

/// Wraps `tokio::sync::mpsc::Sender`, used for the bounded, ordered
/// per-message-group channels backing [`crate::bus::OrderedBus`].
#[derive(Debug, Clone)]
pub struct BoundedTx<T>(mpsc::Sender<T>);

impl<T> BoundedTx<T> {
    pub fn new(sender: mpsc::Sender<T>) -> Self {
        Self(sender)
    }

    pub async fn send_async(&self, item: T) -> Result<(), EventBusError> {
        self.0.send(item).await.map_err(|_| EventBusError::ReceiverDropped)
    }
}

impl<T: Send + Sync> Tx<T> for BoundedTx<T> {
    fn send(&self, item: T) -> Result<(), EventBusError> {
        self.0.try_send(item).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => EventBusError::GroupChannelClosed {
                group_key: "<unknown: channel full>".to_string(),
            },
            mpsc::error::TrySendError::Closed(_) => EventBusError::ReceiverDropped,
        })
    }
}

/// A `Tx` that silently drops the item rather than erroring, used by
/// components that fire-and-forget telemetry onto a possibly-absent bus
/// (e.g. a test harness with no subscriber attached).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelTxDroppable;

impl<T: Send + Sync> Tx<T> for ChannelTxDroppable {
    fn send(&self, _item: T) -> Result<(), EventBusError> {
        Ok(())
    }
}
