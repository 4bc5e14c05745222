use glidepath::GlidepathError;
use glidepath_broker::{Account, BrokerClient, PaperBrokerClient};
use rust_decimal::Decimal;

use crate::error::CliError;

/// Lists open positions. Backed by a fresh, zero-seeded paper broker, see
/// the `Positions` doc comment in `cli.rs` for why this is always empty
/// outside a single `run` invocation's lifetime.
pub async fn positions() -> Result<(), CliError> {
    let broker = PaperBrokerClient::new(Account {
        cash: Decimal::ZERO,
        buying_power: Decimal::ZERO,
        portfolio_value: Decimal::ZERO,
    });
    let positions = broker.get_positions().await.map_err(GlidepathError::from)?;

    if positions.is_empty() {
        println!("no open positions");
        return Ok(());
    }
    for position in positions {
        println!(
            "{}: {} shares @ {} avg, {} market value",
            position.symbol, position.quantity, position.average_entry_price, position.market_value
        );
    }
    Ok(())
}
