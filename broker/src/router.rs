//! Demultiplexes the broker's single long-lived trade-update stream into
//! per-`order_id` channels, so each execution worker can `await` just the
//! updates for the order it placed instead of filtering a shared stream.
//!
//! Grounded on the "goroutine/task that demultiplexes stream events into
//! per-order_id channels" design note: one background task owns the
//! broadcast receiver and fans events out to registered `mpsc` senders.
//! Registration is reference-counted implicitly by `mpsc::Receiver` drop.
//! When the last registered receiver for an `order_id` is dropped, this
//! router silently stops delivering to it on the next prune.

use std::collections::HashMap;
use std::sync::Arc;

use glidepath_core_types::OrderId;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::traits::TradeUpdate;

/// Owns the fan-out task and the registration table.
#[derive(Clone)]
pub struct TradeUpdateRouter {
    registrations: Arc<Mutex<HashMap<OrderId, mpsc::UnboundedSender<TradeUpdate>>>>,
}

impl std::fmt::Debug for TradeUpdateRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeUpdateRouter").finish_non_exhaustive()
    }
}

impl TradeUpdateRouter {
    /// Spawns the background demultiplexing task against `stream`. The
    /// task runs until the broadcast channel closes (broker shutdown).
    pub fn spawn(mut stream: broadcast::Receiver<TradeUpdate>) -> Self {
        let registrations: Arc<Mutex<HashMap<OrderId, mpsc::UnboundedSender<TradeUpdate>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let task_registrations = registrations.clone();

        tokio::spawn(async move {
            loop {
                match stream.recv().await {
                    Ok(update) => {
                        let mut registrations = task_registrations.lock();
                        let is_closed = match registrations.get(&update.order_id) {
                            Some(sender) => sender.send(update).is_err(),
                            None => false,
                        };
                        if is_closed {
                            registrations.remove(&update.order_id);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "trade-update router lagged behind broadcast stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self { registrations }
    }

    /// Registers interest in updates for one order, returning a dedicated
    /// receiver. Call once per submitted order.
    pub fn register(&self, order_id: OrderId) -> mpsc::UnboundedReceiver<TradeUpdate> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.registrations.lock().insert(order_id, sender);
        receiver
    }

    pub fn unregister(&self, order_id: &OrderId) {
        self.registrations.lock().remove(order_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::traits::TradeUpdateEventType;

    fn update(order_id: &str, event_type: TradeUpdateEventType) -> TradeUpdate {
        TradeUpdate {
            order_id: order_id.into(),
            event_type,
            filled_quantity: Decimal::ZERO,
            average_price: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn routes_updates_only_to_the_registered_order() {
        let (sender, receiver) = broadcast::channel(16);
        let router = TradeUpdateRouter::spawn(receiver);

        let mut order_a = router.register(OrderId::from("A"));
        let mut order_b = router.register(OrderId::from("B"));

        sender.send(update("A", TradeUpdateEventType::New)).unwrap();
        sender.send(update("B", TradeUpdateEventType::Fill)).unwrap();

        let a_update = order_a.recv().await.unwrap();
        assert_eq!(a_update.event_type, TradeUpdateEventType::New);

        let b_update = order_b.recv().await.unwrap();
        assert_eq!(b_update.event_type, TradeUpdateEventType::Fill);
    }
}
