use glidepath::GlidepathError;
use glidepath_broker::{Account, BrokerClient, PaperBrokerClient};
use glidepath_core_types::OrderId;
use rust_decimal::Decimal;

use crate::error::CliError;

/// Cancels an order. Backed by a fresh paper broker (see `positions`'s
/// doc comment), in this in-memory configuration the order will always
/// be unknown; the plumbing is identical to what a live broker adapter
/// would need.
pub async fn cancel(order_id: &str) -> Result<(), CliError> {
    let broker = PaperBrokerClient::new(Account {
        cash: Decimal::ZERO,
        buying_power: Decimal::ZERO,
        portfolio_value: Decimal::ZERO,
    });
    let order_id: OrderId = order_id.into();
    broker.cancel_order(&order_id).await.map_err(GlidepathError::from)?;
    println!("canceled {order_id}");
    Ok(())
}
