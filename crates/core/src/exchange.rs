//! Exchange identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an exchange name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown exchange: {0}")]
pub struct UnknownExchange(pub String);

/// Futures exchange identifier.
///
/// The declaration order is the canonical order used by [`ExchangePair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Exchange {
    Mexc,
    Binance,
    Bybit,
    GateIO,
    KuCoin,
    Okx,
    BingX,
}

impl Exchange {
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Mexc => "MEXC",
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
            Exchange::GateIO => "Gate",
            Exchange::KuCoin => "KuCoin",
            Exchange::Okx => "OKX",
            Exchange::BingX => "BingX",
        }
    }

    pub fn all() -> &'static [Exchange] {
        &[
            Exchange::Mexc,
            Exchange::Binance,
            Exchange::Bybit,
            Exchange::GateIO,
            Exchange::KuCoin,
            Exchange::Okx,
            Exchange::BingX,
        ]
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mexc" => Ok(Exchange::Mexc),
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "gate" | "gateio" | "gate.io" => Ok(Exchange::GateIO),
            "kucoin" => Ok(Exchange::KuCoin),
            "okx" => Ok(Exchange::Okx),
            "bingx" => Ok(Exchange::BingX),
            _ => Err(UnknownExchange(s.to_string())),
        }
    }
}

impl TryFrom<String> for Exchange {
    type Error = UnknownExchange;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Exchange> for String {
    fn from(exchange: Exchange) -> Self {
        exchange.as_str().to_string()
    }
}

/// Unordered pair of two exchanges.
///
/// `ExchangePair::new(a, b) == ExchangePair::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangePair {
    first: Exchange,
    second: Exchange,
}

impl ExchangePair {
    pub fn new(a: Exchange, b: Exchange) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> Exchange {
        self.first
    }

    pub fn second(&self) -> Exchange {
        self.second
    }
}

impl fmt::Display for ExchangePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first(), self.second())
    }
}
