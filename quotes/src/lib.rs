#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Quotes
//!
//! A shared, process-wide quote cache fed by the broker's market-data
//! stream: a reader-writer-locked map bounded to N symbols with LRU
//! eviction, favoring symbols with open orders, plus a simple reference
//! counter per subscription so the last worker interested in a symbol is
//! the one that releases it.

pub mod cache;
pub mod error;

pub use cache::QuoteCache;
pub use error::QuoteCacheError;
