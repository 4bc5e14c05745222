#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Events
//!
//! The event bus abstraction that carries messages between the Signal,
//! Portfolio, and Execution stages: at-least-once delivery, ordered per
//! message-group key, with `correlation_id`/`causation_id` propagated on
//! every message.
//!
//! This crate does not talk to a real queue (SQS, Kafka, ...), it defines
//! the [`EventBus`] trait those adapters would implement, plus an
//! in-process [`OrderedBus`] used by tests and single-host deployments.

pub mod bus;
pub mod channel;
pub mod collection;
pub mod error;
pub mod message;
pub mod snapshot;

pub use bus::{EventBus, OrderedBus};
pub use error::EventBusError;
pub use message::{Envelope, WorkflowEvent, WorkflowFailed};
pub use snapshot::Snapshot;
