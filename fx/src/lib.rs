//! RateSync FX
//!
//! Everything between a provider endpoint and a merged rate set.
//!
//! # Features
//!
//! - Rebasing of arbitrary-base rates onto the reference currency
//! - Priority-ordered merging of several providers' rates
//! - Provider adapters (Fixer, Frankfurter) over a pluggable transport
//!
//! # Example
//!
//! ```rust,ignore
//! use ratesync_fx::{FrankfurterSource, HttpTransport, RateSource, DEFAULT_TIMEOUT};
//! use ratesync_common::Currency;
//!
//! let transport = HttpTransport::new(DEFAULT_TIMEOUT)?;
//! let source = FrankfurterSource::new(Currency::eur());
//! let snapshot = source.fetch(&transport).await?;
//! ```

pub mod normalization;
pub mod merge;
pub mod provider;
pub mod transport;
pub mod fixer;
pub mod frankfurter;
pub mod error;

pub use normalization::rebase;
pub use merge::{merge_rates, merged_date};
pub use provider::{RateSource, SymbolSource};
pub use transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
#[cfg(any(test, feature = "test-utils"))]
pub use transport::StaticTransport;
pub use fixer::FixerSource;
pub use frankfurter::FrankfurterSource;
pub use error::{TransportError, TransportResult};
