//! Cross-exchange spread opportunities.

use crate::{Exchange, ExchangePair, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price gap between two exchanges that passed every filter.
///
/// The long leg is the cheaper exchange, the short leg the richer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadOpportunity {
    pub symbol: Symbol,
    /// Exchange to buy on (lower price)
    pub long_exchange: Exchange,
    pub long_price: Decimal,
    /// Exchange to sell on (higher price)
    pub short_exchange: Exchange,
    pub short_price: Decimal,
    /// `|long - short| / min(long, short) * 100`
    pub spread_percent: Decimal,
    /// Heuristic confidence, 0..=100
    pub quality_score: u32,
    /// Larger-magnitude funding rate of the two legs, as a fraction
    pub funding_rate: Option<Decimal>,
    /// Smaller 24h USDT volume of the two legs
    pub volume_24h: Decimal,
    pub detected_at: DateTime<Utc>,
}

impl SpreadOpportunity {
    /// Unordered exchange pair, used as the deduplication key.
    pub fn pair(&self) -> ExchangePair {
        ExchangePair::new(self.long_exchange, self.short_exchange)
    }

    /// Funding rate in percent, if known.
    pub fn funding_rate_percent(&self) -> Option<Decimal> {
        self.funding_rate.and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    }
}
