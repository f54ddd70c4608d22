//! USDT-margined perpetual symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string cannot be read as a USDT perpetual symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid symbol: {0:?}")]
pub struct InvalidSymbol(pub String);

/// A USDT-margined perpetual contract, identified by its base asset.
///
/// Exchanges spell the same contract differently (`BTCUSDT`, `BTC_USDT`,
/// `BTC-USDT-SWAP`); all of them parse to the same `Symbol`, displayed as
/// `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    base: String,
}

impl Symbol {
    /// Quote currency shared by every monitored contract.
    pub const QUOTE: &'static str = "USDT";

    /// Create a symbol from a base asset. Returns `None` if the base is not
    /// a non-empty alphanumeric string.
    pub fn new(base: &str) -> Option<Self> {
        let base = base.to_uppercase();
        if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self { base })
    }

    /// Parse any of the common exchange spellings.
    ///
    /// Accepts `BTC/USDT`, `BTCUSDT`, `BTC_USDT`, `BTC-USDT`, `BTC-USDT-SWAP`,
    /// `BTC/USDT:USDT` and a bare base asset such as `btc`.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        let upper = upper.strip_suffix(":USDT").unwrap_or(&upper);
        let upper = upper.strip_suffix("-SWAP").unwrap_or(upper);

        let compact: String = upper
            .chars()
            .filter(|c| !matches!(c, '/' | '_' | '-'))
            .collect();

        match compact.strip_suffix(Self::QUOTE) {
            Some("") => None,
            Some(base) => Self::new(base),
            None => Self::new(&compact),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Concatenated form used by Binance, Bybit and most REST APIs (`BTCUSDT`).
    pub fn compact(&self) -> String {
        format!("{}{}", self.base, Self::QUOTE)
    }

    /// MEXC contract code (`BTC_USDT`).
    pub fn mexc_contract(&self) -> String {
        format!("{}_{}", self.base, Self::QUOTE)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, Self::QUOTE)
    }
}

impl FromStr for Symbol {
    type Err = InvalidSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidSymbol(s.to_string()))
    }
}

impl TryFrom<String> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exchange_spellings() {
        let btc = Symbol::new("BTC").unwrap();
        for raw in [
            "BTC/USDT",
            "BTCUSDT",
            "btcusdt",
            "BTC_USDT",
            "BTC-USDT",
            "BTC-USDT-SWAP",
            "BTC/USDT:USDT",
            "btc",
            "  BTC ",
        ] {
            assert_eq!(Symbol::parse(raw).as_ref(), Some(&btc), "raw = {raw}");
        }
    }

    #[test]
    fn test_parse_numeric_prefix() {
        let pepe = Symbol::parse("1000PEPE_USDT").unwrap();
        assert_eq!(pepe.base(), "1000PEPE");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Symbol::parse(""), None);
        assert_eq!(Symbol::parse("USDT"), None);
        assert_eq!(Symbol::parse("/USDT"), None);
        assert_eq!(Symbol::parse("BTC USDT"), None);
        assert_eq!(Symbol::parse("<b>"), None);
    }

    #[test]
    fn test_display_and_forms() {
        let eth = Symbol::parse("ETHUSDT").unwrap();
        assert_eq!(eth.to_string(), "ETH/USDT");
        assert_eq!(eth.compact(), "ETHUSDT");
        assert_eq!(eth.mexc_contract(), "ETH_USDT");
    }

    #[test]
    fn test_serde_as_display_string() {
        let sol = Symbol::new("sol").unwrap();
        let json = serde_json::to_string(&sol).unwrap();
        assert_eq!(json, "\"SOL/USDT\"");
        let parsed: Symbol = serde_json::from_str("\"SOLUSDT\"").unwrap();
        assert_eq!(parsed, sol);
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
    }
}
