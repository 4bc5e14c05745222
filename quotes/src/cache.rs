//! The quote cache itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use glidepath_broker::BrokerClient;
use glidepath_core_types::{Quote, Symbol};
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::QuoteCacheError;

struct Entry {
    quote: Quote,
    subscriber_count: usize,
}

/// A shared quote cache bounded to `capacity` symbols. Reads and writes
/// are guarded by a single reader-writer lock, cheap for the read-mostly,
/// small-map access pattern of a quote cache, and simpler to reason about
/// than sharding, which this workload has never needed.
///
/// Eviction is LRU among symbols with zero subscribers: a symbol with an
/// open order (`subscriber_count > 0`) is never evicted, matching the
/// "LRU eviction favoring symbols with open orders" resource policy.
pub struct QuoteCache {
    broker: Arc<dyn BrokerClient>,
    capacity: usize,
    entries: RwLock<IndexMap<Symbol, Entry>>,
}

impl std::fmt::Debug for QuoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteCache")
            .field("capacity", &self.capacity)
            .field("len", &self.entries.read().len())
            .finish()
    }
}

impl QuoteCache {
    pub fn new(broker: Arc<dyn BrokerClient>, capacity: usize) -> Self {
        Self {
            broker,
            capacity,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Called by the market-data stream consumer whenever a fresh quote
    /// arrives. Moves the symbol to the most-recently-used position.
    pub fn update(&self, symbol: Symbol, quote: Quote) {
        let mut entries = self.entries.write();
        let subscriber_count = entries.shift_remove(&symbol).map(|entry| entry.subscriber_count).unwrap_or(0);
        entries.insert(symbol, Entry { quote, subscriber_count });
    }

    /// Returns the cached quote for `symbol` if present and no older than
    /// `max_staleness`.
    pub fn get_fresh(&self, symbol: &Symbol, max_staleness: Duration) -> Result<Quote, QuoteCacheError> {
        let entries = self.entries.read();
        let entry = entries.get(symbol).ok_or_else(|| QuoteCacheError::NoQuote(symbol.clone()))?;
        let age = entry.quote.staleness_age(Utc::now());
        let max_staleness =
            chrono::Duration::from_std(max_staleness).unwrap_or_else(|_| chrono::Duration::zero());
        if age > max_staleness {
            return Err(QuoteCacheError::Stale {
                symbol: symbol.clone(),
                age_ms: age.num_milliseconds(),
                max_age_ms: max_staleness.num_milliseconds(),
            });
        }
        Ok(entry.quote)
    }

    /// Subscribes to `symbol`'s market data if not already cached, and
    /// increments its reference count. The first subscriber for a symbol
    /// triggers the broker subscription and, if the cache is at capacity,
    /// evicts the least-recently-used zero-subscriber entry.
    pub async fn subscribe(&self, symbol: Symbol) -> Result<(), QuoteCacheError> {
        let needs_broker_subscription = {
            let mut entries = self.entries.write();
            match entries.get_mut(&symbol) {
                Some(entry) => {
                    entry.subscriber_count += 1;
                    false
                }
                None => {
                    self.evict_one_if_full(&mut entries);
                    entries.insert(
                        symbol.clone(),
                        Entry {
                            quote: Quote {
                                bid_price: rust_decimal::Decimal::ZERO,
                                ask_price: rust_decimal::Decimal::ZERO,
                                bid_size: rust_decimal::Decimal::ZERO,
                                ask_size: rust_decimal::Decimal::ZERO,
                                timestamp: Utc::now() - chrono::Duration::days(1),
                            },
                            subscriber_count: 1,
                        },
                    );
                    true
                }
            }
        };

        if needs_broker_subscription {
            self.broker.subscribe_market_data(&symbol).await?;
        }
        Ok(())
    }

    /// Decrements `symbol`'s reference count; releases the broker
    /// subscription when it reaches zero. The entry itself is left in the
    /// cache (now eligible for LRU eviction) rather than removed eagerly.
    pub async fn unsubscribe(&self, symbol: &Symbol) -> Result<(), QuoteCacheError> {
        let should_release = {
            let mut entries = self.entries.write();
            match entries.get_mut(symbol) {
                Some(entry) if entry.subscriber_count > 0 => {
                    entry.subscriber_count -= 1;
                    entry.subscriber_count == 0
                }
                _ => false,
            }
        };
        if should_release {
            self.broker.unsubscribe_market_data(symbol).await?;
        }
        Ok(())
    }

    fn evict_one_if_full(&self, entries: &mut IndexMap<Symbol, Entry>) {
        if entries.len() < self.capacity {
            return;
        }
        let victim = entries
            .iter()
            .find(|(_, entry)| entry.subscriber_count == 0)
            .map(|(symbol, _)| symbol.clone());
        if let Some(victim) = victim {
            entries.shift_remove(&victim);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use glidepath_broker::PaperBrokerClient;
    use glidepath_broker::traits::Account;
    use rust_decimal_macros::dec;

    use super::*;

    fn cache(capacity: usize) -> QuoteCache {
        let broker: Arc<dyn BrokerClient> = Arc::new(PaperBrokerClient::new(Account {
            cash: dec!(0),
            buying_power: dec!(0),
            portfolio_value: dec!(0),
        }));
        QuoteCache::new(broker, capacity)
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn fresh_quote() -> Quote {
        Quote {
            bid_price: dec!(100),
            ask_price: dec!(100.05),
            bid_size: dec!(10),
            ask_size: dec!(10),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_fresh_rejects_quotes_older_than_max_staleness() {
        let cache = cache(10);
        cache.update(
            symbol("AAPL"),
            Quote {
                timestamp: Utc::now() - chrono::Duration::seconds(5),
                ..fresh_quote()
            },
        );
        let err = cache.get_fresh(&symbol("AAPL"), Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, QuoteCacheError::Stale { .. }));
    }

    #[tokio::test]
    async fn get_fresh_succeeds_within_staleness_window() {
        let cache = cache(10);
        cache.update(symbol("AAPL"), fresh_quote());
        let quote = cache.get_fresh(&symbol("AAPL"), Duration::from_secs(2)).unwrap();
        assert_eq!(quote.bid_price, dec!(100));
    }

    #[tokio::test]
    async fn eviction_never_removes_a_symbol_with_active_subscribers() {
        let cache = cache(1);
        cache.subscribe(symbol("AAPL")).await.unwrap();
        cache.subscribe(symbol("MSFT")).await.unwrap();
        assert_eq!(cache.len(), 2, "subscribed symbols are never evicted even over capacity");
    }

    #[tokio::test]
    async fn unsubscribe_releases_broker_subscription_only_at_zero_refcount() {
        let cache = cache(10);
        cache.subscribe(symbol("AAPL")).await.unwrap();
        cache.subscribe(symbol("AAPL")).await.unwrap();
        cache.unsubscribe(&symbol("AAPL")).await.unwrap();
        assert_eq!(cache.len(), 1);
        cache.unsubscribe(&symbol("AAPL")).await.unwrap();
        assert_eq!(cache.len(), 1, "entry remains cached after last unsubscribe, just evictable");
    }
}
