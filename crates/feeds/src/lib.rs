//! Futures quote collection from exchange REST APIs.
//!
//! ## Architecture
//!
//! - `adapter/` - One [`QuoteSource`] per exchange, normalizing bulk ticker
//!   payloads into [`spread_core::PriceQuote`]s
//! - `rest` - Shared HTTP client
//! - `manager` - [`FeedSet`], which polls every source once per cycle

pub mod adapter;
pub mod error;
pub mod manager;
pub mod rest;

pub use adapter::{
    source_for, BinanceAdapter, BingXAdapter, BybitAdapter, GateIOAdapter, KuCoinAdapter,
    MexcAdapter, OkxAdapter, QuoteSource,
};
pub use error::*;
pub use manager::*;
pub use rest::*;
