#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Broker
//!
//! The broker capability surface consumed by the Execution Stage: submit
//! limit/market/notional/close-position orders, cancel, query; fetch
//! positions, account, quotes, bars; subscribe to the trade-update and
//! market-data streams. Wire protocol and credential loading are out of
//! scope, this crate defines the trait and ships one real
//! implementation, [`paper::PaperBrokerClient`], an in-memory simulated
//! exchange for tests and paper-mode operation.

pub mod error;
pub mod paper;
pub mod request;
pub mod router;
pub mod traits;

pub use error::BrokerError;
pub use paper::PaperBrokerClient;
pub use request::{OrderRequest, OrderKind};
pub use router::TradeUpdateRouter;
pub use traits::{Account, BrokerClient, Position, TradeUpdate, TradeUpdateEventType};
