//! RateSync Common Types
//!
//! This crate contains shared types used across the RateSync workspace,
//! including identifiers, currency codes, snapshot records, sync outcomes
//! and the error taxonomy.

pub mod identifiers;
pub mod currency;
pub mod snapshot;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use currency::*;
pub use snapshot::*;
pub use error::*;
pub use time::*;
