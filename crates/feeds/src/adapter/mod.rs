//! Exchange REST adapters.
//!
//! Each exchange publishes its perpetual tickers in its own JSON shape.
//! Adapters fetch the bulk ticker endpoint and normalize every USDT
//! perpetual into a [`PriceQuote`].

mod binance;
mod bingx;
mod bybit;
mod gateio;
mod kucoin;
mod mexc;
mod okx;

pub use binance::BinanceAdapter;
pub use bingx::BingXAdapter;
pub use bybit::BybitAdapter;
pub use gateio::GateIOAdapter;
pub use kucoin::KuCoinAdapter;
pub use mexc::MexcAdapter;
pub use okx::OkxAdapter;

use crate::{FeedError, RestClient};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote};
use std::str::FromStr;

/// A source of futures quotes for one exchange.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Exchange this source reads from.
    fn exchange(&self) -> Exchange;

    /// Fetch every USDT perpetual the exchange lists, in one bulk request
    /// where the API allows it.
    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError>;
}

/// Build the REST adapter for `exchange`.
pub fn source_for(exchange: Exchange, client: RestClient) -> Box<dyn QuoteSource> {
    match exchange {
        Exchange::Mexc => Box::new(MexcAdapter::new(client)),
        Exchange::Binance => Box::new(BinanceAdapter::new(client)),
        Exchange::Bybit => Box::new(BybitAdapter::new(client)),
        Exchange::GateIO => Box::new(GateIOAdapter::new(client)),
        Exchange::KuCoin => Box::new(KuCoinAdapter::new(client)),
        Exchange::Okx => Box::new(OkxAdapter::new(client)),
        Exchange::BingX => Box::new(BingXAdapter::new(client)),
    }
}

/// Numeric field that exchanges send either as a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl RawDecimal {
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawDecimal::Text(s) => parse_decimal(s),
            RawDecimal::Number(n) => parse_decimal(&n.to_string()),
        }
    }
}

/// Parse a decimal string, including scientific notation (`1e-05`).
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Decode an optional raw field, treating missing and unparsable the same.
pub(crate) fn decimal(field: &Option<RawDecimal>) -> Option<Decimal> {
    field.as_ref().and_then(RawDecimal::to_decimal)
}

/// First strictly positive value among `candidates`.
pub(crate) fn positive(candidates: &[Option<Decimal>]) -> Option<Decimal> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|d| *d > Decimal::ZERO)
}
