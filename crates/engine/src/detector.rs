//! Cross-exchange spread detector.
//!
//! Compares two quotes for the same perpetual, computes the relative price
//! gap and applies the volume, funding and quality filters.

use crate::QualityWeights;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_core::{Exchange, ExchangePair, PriceQuote, SpreadOpportunity, Symbol};
use thiserror::Error;
use tracing::debug;

/// Thresholds applied to every candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum spread in percent.
    #[serde(alias = "min_percent")]
    pub min_spread_percent: Decimal,
    /// Spreads at or above this bypass the volume filter and use the lower
    /// quality floor.
    pub high_spread_percent: Decimal,
    /// Minimum 24h USDT volume on the thinner leg.
    pub min_volume_usdt: Decimal,
    /// Maximum absolute funding rate on either leg, in percent.
    pub max_funding_rate_percent: Decimal,
    /// Minimum quality score.
    pub quality_floor: u32,
    /// Minimum quality score for high spreads.
    pub high_spread_quality_floor: u32,
    /// Score weights.
    pub quality: QualityWeights,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_spread_percent: Decimal::from(3),
            high_spread_percent: Decimal::from(8),
            min_volume_usdt: Decimal::from(500_000),
            max_funding_rate_percent: Decimal::new(5, 1),
            quality_floor: 30,
            high_spread_quality_floor: 20,
            quality: QualityWeights::default(),
        }
    }
}

/// Why a pair of quotes did not produce an opportunity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("quotes are for different symbols ({0} vs {1})")]
    SymbolMismatch(Symbol, Symbol),

    #[error("both quotes come from {0}")]
    SameExchange(Exchange),

    #[error("non-positive price on {0}")]
    InvalidPrice(Exchange),

    #[error("spread between {low} and {high} is out of range")]
    SpreadOutOfRange { low: Decimal, high: Decimal },

    #[error("spread {spread:.2}% below minimum {min}%")]
    SpreadTooLow { spread: Decimal, min: Decimal },

    #[error("volume {volume} below minimum {min}")]
    VolumeTooLow { volume: Decimal, min: Decimal },

    #[error("funding {rate_percent:.4}% on {exchange} exceeds {max}%")]
    FundingTooHigh {
        exchange: Exchange,
        rate_percent: Decimal,
        max: Decimal,
    },

    #[error("quality {score} below floor {floor}")]
    QualityTooLow { score: u32, floor: u32 },
}

/// Stateless spread detector.
#[derive(Debug, Clone, Default)]
pub struct SpreadDetector {
    config: DetectorConfig,
}

impl SpreadDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// `|a - b| / min(a, b) * 100`, or `None` if the result does not fit
    /// in a `Decimal`.
    pub fn spread_percent(a: Decimal, b: Decimal) -> Option<Decimal> {
        let low = a.min(b);
        if low <= Decimal::ZERO {
            return Some(Decimal::ZERO);
        }
        (a - b)
            .abs()
            .checked_div(low)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    /// Run every filter on a pair of quotes.
    ///
    /// The cheaper exchange becomes the long leg. `detected_at` is the later
    /// of the two fetch times.
    pub fn evaluate(&self, a: &PriceQuote, b: &PriceQuote) -> Result<SpreadOpportunity, Rejection> {
        if a.symbol != b.symbol {
            return Err(Rejection::SymbolMismatch(a.symbol.clone(), b.symbol.clone()));
        }
        if a.exchange == b.exchange {
            return Err(Rejection::SameExchange(a.exchange));
        }
        for quote in [a, b] {
            if !quote.is_valid() {
                return Err(Rejection::InvalidPrice(quote.exchange));
            }
        }

        let config = &self.config;
        let spread = Self::spread_percent(a.mark_price, b.mark_price).ok_or(
            Rejection::SpreadOutOfRange {
                low: a.mark_price.min(b.mark_price),
                high: a.mark_price.max(b.mark_price),
            },
        )?;
        if spread < config.min_spread_percent {
            return Err(Rejection::SpreadTooLow {
                spread,
                min: config.min_spread_percent,
            });
        }

        let high_spread = spread >= config.high_spread_percent;
        let volume = a.volume_24h.min(b.volume_24h);
        if volume < config.min_volume_usdt && !high_spread {
            return Err(Rejection::VolumeTooLow {
                volume,
                min: config.min_volume_usdt,
            });
        }

        for quote in [a, b] {
            if let Some(rate) = quote.funding_rate {
                // a rate too large to scale is over any cap
                let rate_percent = rate
                    .checked_mul(Decimal::ONE_HUNDRED)
                    .unwrap_or(if rate.is_sign_negative() { Decimal::MIN } else { Decimal::MAX });
                if rate_percent.abs() > config.max_funding_rate_percent {
                    return Err(Rejection::FundingTooHigh {
                        exchange: quote.exchange,
                        rate_percent,
                        max: config.max_funding_rate_percent,
                    });
                }
            }
        }

        let score = config.quality.score(spread, volume);
        let floor = if high_spread {
            config.high_spread_quality_floor
        } else {
            config.quality_floor
        };
        if score < floor {
            return Err(Rejection::QualityTooLow { score, floor });
        }

        let (long, short) = if a.mark_price <= b.mark_price { (a, b) } else { (b, a) };
        let funding_rate = match (a.funding_rate, b.funding_rate) {
            (Some(x), Some(y)) => Some(if y.abs() > x.abs() { y } else { x }),
            (x, y) => x.or(y),
        };

        Ok(SpreadOpportunity {
            symbol: a.symbol.clone(),
            long_exchange: long.exchange,
            long_price: long.mark_price,
            short_exchange: short.exchange,
            short_price: short.mark_price,
            spread_percent: spread,
            quality_score: score,
            funding_rate,
            volume_24h: volume,
            detected_at: a.fetched_at.max(b.fetched_at),
        })
    }

    /// Like [`evaluate`](Self::evaluate), logging the rejection reason.
    pub fn detect(&self, a: &PriceQuote, b: &PriceQuote) -> Option<SpreadOpportunity> {
        match self.evaluate(a, b) {
            Ok(opp) => Some(opp),
            Err(reason) => {
                debug!(
                    symbol = %a.symbol,
                    pair = %ExchangePair::new(a.exchange, b.exchange),
                    "Rejected: {}",
                    reason
                );
                None
            }
        }
    }

    /// Evaluate every pair among `quotes` (one symbol, one quote per
    /// exchange). Best quality first, then widest spread.
    pub fn detect_all(&self, quotes: &[PriceQuote]) -> Vec<SpreadOpportunity> {
        let mut found = Vec::new();
        for (i, a) in quotes.iter().enumerate() {
            for b in &quotes[i + 1..] {
                if let Some(opp) = self.detect(a, b) {
                    found.push(opp);
                }
            }
        }

        found.sort_by(|x, y| {
            y.quality_score
                .cmp(&x.quality_score)
                .then_with(|| y.spread_percent.cmp(&x.spread_percent))
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn quote(exchange: Exchange, price: Decimal, volume: Decimal, funding: Option<Decimal>) -> PriceQuote {
        PriceQuote::new(exchange, Symbol::new("BTC").unwrap(), price, volume, funding, Utc::now())
    }

    #[test]
    fn test_detector_config_default() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_spread_percent, dec!(3));
        assert_eq!(config.high_spread_percent, dec!(8));
        assert_eq!(config.min_volume_usdt, dec!(500000));
        assert_eq!(config.max_funding_rate_percent, dec!(0.5));
        assert_eq!(config.quality_floor, 30);
        assert_eq!(config.high_spread_quality_floor, 20);
    }

    #[test]
    fn test_spread_percent() {
        assert_eq!(SpreadDetector::spread_percent(dec!(100), dec!(109)), Some(dec!(9)));
        assert_eq!(SpreadDetector::spread_percent(dec!(109), dec!(100)), Some(dec!(9)));
        assert_eq!(SpreadDetector::spread_percent(dec!(0), dec!(100)), Some(dec!(0)));
        assert_eq!(SpreadDetector::spread_percent(Decimal::new(1, 28), dec!(100)), None);
    }

    #[test]
    fn test_tiny_price_rejected_without_panic() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, Decimal::new(1, 28), dec!(1000000), None);
        let b = quote(Exchange::Binance, dec!(100), dec!(1000000), None);

        assert_eq!(
            detector.evaluate(&a, &b),
            Err(Rejection::SpreadOutOfRange {
                low: Decimal::new(1, 28),
                high: dec!(100),
            })
        );
        assert!(detector.detect_all(&[a, b]).is_empty());
    }

    #[test]
    fn test_huge_funding_rate_rejected_without_panic() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(100), dec!(1000000), Some(Decimal::MAX));
        let b = quote(Exchange::Binance, dec!(109), dec!(1000000), None);

        assert!(matches!(
            detector.evaluate(&a, &b),
            Err(Rejection::FundingTooHigh { exchange: Exchange::Mexc, .. })
        ));
    }

    #[test]
    fn test_accepts_nine_percent_spread() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(109), dec!(1000000), Some(dec!(0.001)));
        let b = quote(Exchange::Binance, dec!(100), dec!(1000000), Some(dec!(0.001)));

        let opp = detector.evaluate(&a, &b).unwrap();

        assert_eq!(opp.long_exchange, Exchange::Binance);
        assert_eq!(opp.long_price, dec!(100));
        assert_eq!(opp.short_exchange, Exchange::Mexc);
        assert_eq!(opp.spread_percent, dec!(9));
        assert_eq!(opp.quality_score, 42);
        assert_eq!(opp.volume_24h, dec!(1000000));
    }

    #[test]
    fn test_rejects_below_min_spread() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(100), dec!(50000000), None);
        let b = quote(Exchange::Bybit, dec!(102), dec!(50000000), None);

        assert!(matches!(detector.evaluate(&a, &b), Err(Rejection::SpreadTooLow { .. })));
    }

    #[test]
    fn test_low_volume_rejected_below_high_spread() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(100), dec!(100000), None);
        let b = quote(Exchange::Bybit, dec!(105), dec!(100000), None);

        assert_eq!(
            detector.evaluate(&a, &b),
            Err(Rejection::VolumeTooLow { volume: dec!(100000), min: dec!(500000) })
        );
    }

    #[test]
    fn test_high_spread_bypasses_volume_with_lower_floor() {
        let detector = SpreadDetector::default();
        // 8% spread scores exactly 20 with no volume points
        let a = quote(Exchange::Mexc, dec!(100), dec!(100000), None);
        let b = quote(Exchange::GateIO, dec!(108), dec!(100000), None);

        let opp = detector.evaluate(&a, &b).unwrap();
        assert_eq!(opp.quality_score, 20);
    }

    #[test]
    fn test_quality_floor_below_high_spread() {
        let detector = SpreadDetector::default();
        // 5% * 2.5 = 12.5, plus 10 for 500K volume: 22 < 30
        let a = quote(Exchange::Mexc, dec!(100), dec!(600000), None);
        let b = quote(Exchange::Okx, dec!(105), dec!(600000), None);

        assert_eq!(
            detector.evaluate(&a, &b),
            Err(Rejection::QualityTooLow { score: 22, floor: 30 })
        );
    }

    #[test]
    fn test_funding_cap_applies_at_any_spread() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(100), dec!(20000000), Some(dec!(-0.006)));
        let b = quote(Exchange::Binance, dec!(120), dec!(20000000), Some(dec!(0.0001)));

        assert!(matches!(
            detector.evaluate(&a, &b),
            Err(Rejection::FundingTooHigh { exchange: Exchange::Mexc, .. })
        ));
    }

    #[test]
    fn test_unknown_funding_passes_and_larger_rate_kept() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Okx, dec!(100), dec!(3000000), None);
        let b = quote(Exchange::Mexc, dec!(110), dec!(3000000), Some(dec!(-0.003)));

        let opp = detector.evaluate(&a, &b).unwrap();
        assert_eq!(opp.funding_rate, Some(dec!(-0.003)));

        let c = quote(Exchange::Binance, dec!(110), dec!(3000000), Some(dec!(0.001)));
        let opp = detector.evaluate(&b, &c).err();
        assert!(matches!(opp, Some(Rejection::SpreadTooLow { .. })));
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let detector = SpreadDetector::default();
        let a = quote(Exchange::Mexc, dec!(100), dec!(1000000), None);
        let same = quote(Exchange::Mexc, dec!(110), dec!(1000000), None);
        let zero = quote(Exchange::Bybit, dec!(0), dec!(1000000), None);
        let mut eth = quote(Exchange::Bybit, dec!(110), dec!(1000000), None);
        eth.symbol = Symbol::new("ETH").unwrap();

        assert_eq!(detector.evaluate(&a, &same), Err(Rejection::SameExchange(Exchange::Mexc)));
        assert_eq!(detector.evaluate(&a, &zero), Err(Rejection::InvalidPrice(Exchange::Bybit)));
        assert!(matches!(detector.evaluate(&a, &eth), Err(Rejection::SymbolMismatch(..))));
    }

    #[test]
    fn test_detected_at_is_latest_fetch() {
        let detector = SpreadDetector::default();
        let mut a = quote(Exchange::Mexc, dec!(100), dec!(1000000), None);
        let b = quote(Exchange::Bybit, dec!(110), dec!(1000000), None);
        a.fetched_at = b.fetched_at - Duration::seconds(5);

        assert_eq!(detector.evaluate(&a, &b).unwrap().detected_at, b.fetched_at);
    }

    #[test]
    fn test_detect_all_sorted_by_quality() {
        let detector = SpreadDetector::default();
        let quotes = vec![
            quote(Exchange::Mexc, dec!(100), dec!(20000000), None),
            quote(Exchange::Binance, dec!(110), dec!(20000000), None),
            quote(Exchange::Bybit, dec!(100.5), dec!(20000000), None),
            quote(Exchange::BingX, dec!(104), dec!(600000), None),
        ];

        let found = detector.detect_all(&quotes);
        let pairs: Vec<(Exchange, Exchange)> = found
            .iter()
            .map(|o| (o.long_exchange, o.short_exchange))
            .collect();

        // Mexc/Binance: 10% -> 75, Bybit/Binance: ~9.45% -> 73,
        // Mexc/BingX: 4% -> 20 rejected, Bybit/BingX: ~3.48% rejected,
        // BingX/Binance: ~5.77% -> 24 rejected, Mexc/Bybit below minimum
        assert_eq!(
            pairs,
            vec![(Exchange::Mexc, Exchange::Binance), (Exchange::Bybit, Exchange::Binance)]
        );
    }
}
