use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use glidepath::{BrokerMarketData, Workflow};
use glidepath_broker::{Account, BrokerClient, PaperBrokerClient, TradeUpdateRouter};
use glidepath_core_types::{Symbol, TradeStatus};
use glidepath_events::{EventBus, OrderedBus};
use glidepath_portfolio::PortfolioStage;
use glidepath_quotes::QuoteCache;
use glidepath_runstate::{InMemoryLedgerSink, InMemoryRunStateStore, LedgerSink, RunStateStore};
use glidepath_signal::{SignalStage, WeightedStrategy};
use glidepath_strategies::EqualWeightStrategy;
use rust_decimal::Decimal;

use crate::error::CliError;

pub async fn run(config_stem: Option<&str>, symbols: &[String], seed_cash: &str) -> Result<(), CliError> {
    if symbols.is_empty() {
        return Err(CliError::Usage("--symbols must name at least one ticker".into()));
    }
    let symbols: Vec<Symbol> = symbols
        .iter()
        .map(|s| Symbol::parse(s).map_err(|e| CliError::Usage(e.to_string())))
        .collect::<Result<_, _>>()?;
    let seed_cash =
        Decimal::from_str(seed_cash).map_err(|e| CliError::Usage(format!("--seed-cash is not a valid amount: {e}")))?;

    let config = match config_stem {
        Some(stem) => glidepath_config::load_config_from(stem)?,
        None => glidepath_config::load_config()?,
    };

    let broker = Arc::new(PaperBrokerClient::new(Account {
        cash: seed_cash,
        buying_power: seed_cash,
        portfolio_value: seed_cash,
    }));
    let quotes = Arc::new(QuoteCache::new(broker.clone() as Arc<dyn BrokerClient>, 64));
    let run_state: Arc<dyn RunStateStore> = Arc::new(InMemoryRunStateStore::new());
    let ledger: Arc<dyn LedgerSink> = Arc::new(InMemoryLedgerSink::new());
    let trade_updates = Arc::new(TradeUpdateRouter::spawn(broker.subscribe_trade_updates()));
    let event_bus: Arc<dyn EventBus> = Arc::new(OrderedBus::new());
    let market_data = BrokerMarketData::new(broker.clone() as Arc<dyn BrokerClient>);

    let workflow = Workflow::new(
        broker as Arc<dyn BrokerClient>,
        quotes,
        run_state,
        Arc::clone(&ledger),
        event_bus,
        trade_updates,
        SignalStage::new(Decimal::new(1, 3), 1),
        PortfolioStage::new(config.portfolio_limits(), config.sharded_execution),
        config.gating_limits(),
        config.execution_params(),
    );

    let strategies = vec![WeightedStrategy {
        evaluator: Arc::new(EqualWeightStrategy::new("equal_weight", symbols)),
        allocation_share: Decimal::ONE,
    }];

    let outcome = workflow.run(&strategies, &market_data, Utc::now()).await?;
    println!(
        "plan: {} item(s), {} trade(s) submitted",
        outcome.plan.plan.items().len(),
        outcome.trades.len()
    );

    let entries = ledger.all_entries().await;
    if let Some(summary) = glidepath_analytics::run_summary(&entries) {
        println!("{}", glidepath_analytics::render_run_summary(&summary));
    }

    let failed = entries.iter().filter(|e| e.status == TradeStatus::Failed).count();
    if failed > 0 {
        return Err(CliError::CompletedWithErrors { failed, total: entries.len() });
    }
    Ok(())
}
