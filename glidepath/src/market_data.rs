//! The one production [`MarketDataPort`] implementation in the workspace:
//! bars fetched straight from a [`BrokerClient`], with a single retry on a
//! transient failure. `glidepath-strategies`' evaluators only ever see
//! this trait, never the broker directly, so paper-mode tests can swap in
//! their own fixed-bar fixtures without touching a strategy's code.

use std::sync::Arc;

use async_trait::async_trait;
use glidepath_broker::{Bar, BrokerClient};
use glidepath_core_types::Symbol;
use glidepath_signal::{DataUnavailableError, MarketDataPort};

const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct BrokerMarketData {
    broker: Arc<dyn BrokerClient>,
}

impl BrokerMarketData {
    pub fn new(broker: Arc<dyn BrokerClient>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl MarketDataPort for BrokerMarketData {
    async fn bars(&self, symbol: &Symbol, lookback: usize) -> Result<Vec<Bar>, DataUnavailableError> {
        let mut last_reason = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.broker.get_bars(symbol, lookback).await {
                Ok(bars) => return Ok(bars),
                Err(error) if error.is_transient() && attempt < MAX_ATTEMPTS => {
                    last_reason = error.to_string();
                    continue;
                }
                Err(error) => {
                    return Err(DataUnavailableError::Exhausted {
                        symbol: symbol.clone(),
                        attempts: attempt,
                        reason: error.to_string(),
                    });
                }
            }
        }
        Err(DataUnavailableError::Exhausted {
            symbol: symbol.clone(),
            attempts: MAX_ATTEMPTS,
            reason: last_reason,
        })
    }
}
