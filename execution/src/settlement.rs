//! Batched-mode settlement discipline: the SELL phase must clear and free
//! up buying power before the BUY phase is allowed to draw on it.

use std::sync::Arc;
use std::time::Duration;

use glidepath_broker::BrokerClient;
use glidepath_core_types::OrderId;
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Polls order and account state until a run's SELL phase has settled, or
/// gives up after `timeout` and lets the caller proceed anyway, a stuck
/// settlement poll should never itself block the run indefinitely.
pub struct SettlementWaiter {
    broker: Arc<dyn BrokerClient>,
    timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for SettlementWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementWaiter").field("timeout", &self.timeout).finish()
    }
}

impl SettlementWaiter {
    pub fn new(broker: Arc<dyn BrokerClient>, timeout: Duration) -> Self {
        Self {
            broker,
            timeout,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Waits for every sell order to reach a terminal broker status, then
    /// for buying power to rise by at least 95% of `expected_proceeds`
    /// above `buying_power_before`.
    pub async fn wait_for_sell_settlement(
        &self,
        sell_order_ids: &[OrderId],
        expected_proceeds: Decimal,
        buying_power_before: Decimal,
    ) -> Result<(), ExecutionError> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        self.wait_for_orders_terminal(sell_order_ids, deadline).await?;
        self.wait_for_buying_power(buying_power_before, expected_proceeds, deadline).await
    }

    async fn wait_for_orders_terminal(&self, order_ids: &[OrderId], deadline: tokio::time::Instant) -> Result<(), ExecutionError> {
        loop {
            let mut all_terminal = true;
            for order_id in order_ids {
                let order = self.broker.get_order(order_id).await?;
                if !order.status.is_terminal() {
                    all_terminal = false;
                    break;
                }
            }
            if all_terminal || tokio::time::Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn wait_for_buying_power(
        &self,
        before: Decimal,
        expected_proceeds: Decimal,
        deadline: tokio::time::Instant,
    ) -> Result<(), ExecutionError> {
        let threshold = before + expected_proceeds * Decimal::new(95, 2);
        loop {
            let account = self.broker.get_account().await?;
            if account.buying_power >= threshold || tokio::time::Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::Utc;
    use glidepath_broker::{Account, OrderKind, OrderRequest, PaperBrokerClient};
    use glidepath_core_types::{OrderStatus, Symbol, TradeAction, TradeId};
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn settlement_proceeds_once_orders_fill_and_buying_power_rises() {
        let broker = Arc::new(PaperBrokerClient::new(Account {
            cash: dec!(10000),
            buying_power: dec!(10000),
            portfolio_value: dec!(50000),
        }));
        let order_id = broker
            .submit_order(OrderRequest::new(
                TradeId::new(),
                Symbol::parse("AAPL").unwrap(),
                TradeAction::Sell,
                OrderKind::Market { quantity: dec!(10) },
                0,
            ))
            .await
            .unwrap();

        let broker_for_task = broker.clone();
        let order_id_for_task = order_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            broker_for_task.simulate_fill(&order_id_for_task, dec!(10), dec!(150), Utc::now());
        });

        let waiter = SettlementWaiter::new(broker.clone() as Arc<dyn BrokerClient>, StdDuration::from_millis(100))
            .with_poll_interval(StdDuration::from_millis(10));
        waiter.wait_for_sell_settlement(&[order_id.clone()], dec!(1500), dec!(10000)).await.unwrap();

        let order = broker.get_order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
    }
}
