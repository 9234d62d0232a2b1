//! RateSync Protocol Messages
//!
//! JSON bodies exchanged over the RateSync HTTP API.

pub mod messages;

pub use messages::*;
