//! Core types shared by the toolsight delivery pipeline and SDK.
//!
//! This crate holds the pieces every other crate agrees on: the event wire
//! model, the metadata representation with its shallow merge rule, and the
//! clock abstraction used for duration measurement and retry backoff.

pub mod events;
pub mod metadata;
pub mod time;

pub use events::{DeliveryAck, EventPayload, EventType};
pub use metadata::{merge, Metadata};
pub use time::{Clock, RealClock, TestClock};
