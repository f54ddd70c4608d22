//! Price snapshots fetched from exchanges.

use crate::{Exchange, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One exchange's view of a perpetual contract at fetch time.
///
/// Created fresh every poll cycle and discarded after detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Exchange the quote came from
    pub exchange: Exchange,
    /// Contract
    pub symbol: Symbol,
    /// Mark price (last trade price where the exchange has no mark price)
    pub mark_price: Decimal,
    /// 24h traded volume in USDT
    pub volume_24h: Decimal,
    /// Current funding rate as a fraction (0.0001 = 0.01%), if published
    pub funding_rate: Option<Decimal>,
    /// When the quote was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(
        exchange: Exchange,
        symbol: Symbol,
        mark_price: Decimal,
        volume_24h: Decimal,
        funding_rate: Option<Decimal>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exchange,
            symbol,
            mark_price,
            volume_24h,
            funding_rate,
            fetched_at,
        }
    }

    /// Whether the quote carries a usable price.
    pub fn is_valid(&self) -> bool {
        self.mark_price > Decimal::ZERO
    }
}
