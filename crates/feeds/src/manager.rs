//! Per-cycle quote collection across every configured exchange.

use crate::adapter::{source_for, QuoteSource};
use crate::{FeedError, RestClient};
use spread_core::{Exchange, PriceQuote, Symbol};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Quotes collected in one poll cycle, grouped by symbol.
#[derive(Debug, Default)]
pub struct CycleQuotes {
    /// Symbol -> one quote per exchange. Only symbols quoted by at least two
    /// exchanges are kept.
    pub by_symbol: BTreeMap<Symbol, Vec<PriceQuote>>,
    /// Exchanges whose fetch failed this cycle, with the error text
    pub failed: Vec<(Exchange, String)>,
    /// Number of quotes each successful exchange returned
    pub fetched: Vec<(Exchange, usize)>,
}

impl CycleQuotes {
    pub fn symbol_count(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn quote_count(&self) -> usize {
        self.by_symbol.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Symbols shared between a reference exchange and each other exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapReport {
    pub reference: Exchange,
    pub reference_count: usize,
    /// (exchange, symbols listed, symbols shared with the reference)
    pub overlaps: Vec<(Exchange, usize, usize)>,
    pub failed: Vec<(Exchange, String)>,
}

/// The set of quote sources polled each cycle.
pub struct FeedSet {
    sources: Vec<Box<dyn QuoteSource>>,
}

impl FeedSet {
    pub fn new(sources: Vec<Box<dyn QuoteSource>>) -> Self {
        Self { sources }
    }

    /// Build REST adapters for `exchanges`, sharing one HTTP client.
    /// Duplicate entries are ignored.
    pub fn from_exchanges(exchanges: &[Exchange], client: RestClient) -> Self {
        let mut seen = BTreeSet::new();
        let sources = exchanges
            .iter()
            .filter(|e| seen.insert(**e))
            .map(|e| source_for(*e, client.clone()))
            .collect();
        Self { sources }
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.sources.iter().map(|s| s.exchange()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch every source in turn.
    ///
    /// A failing exchange is logged and left out; the others still count.
    pub async fn fetch_cycle(&self, symbols: &[Symbol]) -> CycleQuotes {
        let wanted: BTreeSet<&Symbol> = symbols.iter().collect();
        let mut cycle = CycleQuotes::default();
        let mut grouped: BTreeMap<Symbol, Vec<PriceQuote>> = BTreeMap::new();

        for source in &self.sources {
            let exchange = source.exchange();
            let quotes = match source.fetch_quotes().await {
                Ok(quotes) => quotes,
                Err(e) => {
                    warn!(
                        exchange = %exchange,
                        transient = e.is_transient(),
                        "Fetch failed, skipping exchange this cycle: {}",
                        e
                    );
                    cycle.failed.push((exchange, e.to_string()));
                    continue;
                }
            };

            cycle.fetched.push((exchange, quotes.len()));
            for quote in quotes {
                if !quote.is_valid() {
                    continue;
                }
                if !wanted.is_empty() && !wanted.contains(&quote.symbol) {
                    continue;
                }
                let entry = grouped.entry(quote.symbol.clone()).or_default();
                // first quote per exchange wins
                if entry.iter().all(|q| q.exchange != exchange) {
                    entry.push(quote);
                }
            }
        }

        grouped.retain(|_, quotes| quotes.len() >= 2);
        cycle.by_symbol = grouped;

        debug!(
            symbols = cycle.symbol_count(),
            quotes = cycle.quote_count(),
            failed = cycle.failed.len(),
            "Cycle quotes collected"
        );
        cycle
    }

    /// Count the symbols each exchange shares with `reference`.
    ///
    /// Fails only if the reference exchange itself cannot be fetched.
    pub async fn symbol_overlap(&self, reference: Exchange) -> Result<OverlapReport, FeedError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.exchange() == reference)
            .ok_or_else(|| FeedError::UnsupportedExchange(reference.to_string()))?;

        let reference_symbols: BTreeSet<Symbol> = source
            .fetch_quotes()
            .await?
            .into_iter()
            .map(|q| q.symbol)
            .collect();

        let mut report = OverlapReport {
            reference,
            reference_count: reference_symbols.len(),
            overlaps: Vec::new(),
            failed: Vec::new(),
        };

        for source in self.sources.iter().filter(|s| s.exchange() != reference) {
            let exchange = source.exchange();
            match source.fetch_quotes().await {
                Ok(quotes) => {
                    let symbols: BTreeSet<Symbol> = quotes.into_iter().map(|q| q.symbol).collect();
                    let shared = symbols.intersection(&reference_symbols).count();
                    report.overlaps.push((exchange, symbols.len(), shared));
                }
                Err(e) => {
                    warn!(exchange = %exchange, "Overlap fetch failed: {}", e);
                    report.failed.push((exchange, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// In-memory source returning canned quotes or a fixed error.
    struct FakeSource {
        exchange: Exchange,
        quotes: Vec<(&'static str, Decimal)>,
        fail: bool,
    }

    impl FakeSource {
        fn boxed(exchange: Exchange, quotes: Vec<(&'static str, Decimal)>) -> Box<dyn QuoteSource> {
            Box::new(Self { exchange, quotes, fail: false })
        }

        fn failing(exchange: Exchange) -> Box<dyn QuoteSource> {
            Box::new(Self { exchange, quotes: Vec::new(), fail: true })
        }
    }

    #[async_trait]
    impl QuoteSource for FakeSource {
        fn exchange(&self) -> Exchange {
            self.exchange
        }

        async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
            if self.fail {
                return Err(FeedError::Timeout("fake".into()));
            }
            Ok(self
                .quotes
                .iter()
                .map(|(base, price)| {
                    PriceQuote::new(
                        self.exchange,
                        Symbol::new(base).unwrap(),
                        *price,
                        dec!(1000000),
                        None,
                        Utc::now(),
                    )
                })
                .collect())
        }
    }

    fn sym(base: &str) -> Symbol {
        Symbol::new(base).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_cycle_groups_symbols_on_two_exchanges() {
        let feeds = FeedSet::new(vec![
            FakeSource::boxed(Exchange::Mexc, vec![("BTC", dec!(100)), ("ETH", dec!(10)), ("SOLO", dec!(1))]),
            FakeSource::boxed(Exchange::Binance, vec![("BTC", dec!(101)), ("ETH", dec!(11))]),
        ]);

        let cycle = feeds.fetch_cycle(&[]).await;

        assert_eq!(cycle.symbol_count(), 2);
        assert_eq!(cycle.quote_count(), 4);
        assert!(!cycle.by_symbol.contains_key(&sym("SOLO")));
        assert_eq!(cycle.fetched, vec![(Exchange::Mexc, 3), (Exchange::Binance, 2)]);
    }

    #[tokio::test]
    async fn test_fetch_cycle_filters_configured_symbols() {
        let feeds = FeedSet::new(vec![
            FakeSource::boxed(Exchange::Mexc, vec![("BTC", dec!(100)), ("ETH", dec!(10))]),
            FakeSource::boxed(Exchange::Bybit, vec![("BTC", dec!(101)), ("ETH", dec!(11))]),
        ]);

        let cycle = feeds.fetch_cycle(&[sym("ETH")]).await;

        assert_eq!(cycle.by_symbol.keys().cloned().collect::<Vec<_>>(), vec![sym("ETH")]);
    }

    #[tokio::test]
    async fn test_failed_exchange_is_skipped() {
        let feeds = FeedSet::new(vec![
            FakeSource::boxed(Exchange::Mexc, vec![("BTC", dec!(100))]),
            FakeSource::failing(Exchange::GateIO),
            FakeSource::boxed(Exchange::Okx, vec![("BTC", dec!(102))]),
        ]);

        let cycle = feeds.fetch_cycle(&[]).await;

        assert_eq!(cycle.failed.len(), 1);
        assert_eq!(cycle.failed[0].0, Exchange::GateIO);
        let btc = &cycle.by_symbol[&sym("BTC")];
        assert_eq!(btc.iter().map(|q| q.exchange).collect::<Vec<_>>(), vec![Exchange::Mexc, Exchange::Okx]);
    }

    #[tokio::test]
    async fn test_non_positive_and_duplicate_quotes_dropped() {
        let feeds = FeedSet::new(vec![
            FakeSource::boxed(Exchange::Mexc, vec![("BTC", dec!(100)), ("BTC", dec!(999))]),
            FakeSource::boxed(Exchange::Binance, vec![("BTC", dec!(0))]),
            FakeSource::boxed(Exchange::Bybit, vec![("BTC", dec!(101))]),
        ]);

        let cycle = feeds.fetch_cycle(&[]).await;
        let btc = &cycle.by_symbol[&sym("BTC")];

        assert_eq!(btc.len(), 2);
        assert_eq!(btc[0].mark_price, dec!(100));
        assert_eq!(btc[1].exchange, Exchange::Bybit);
    }

    #[tokio::test]
    async fn test_symbol_overlap() {
        let feeds = FeedSet::new(vec![
            FakeSource::boxed(Exchange::Mexc, vec![("BTC", dec!(1)), ("ETH", dec!(1)), ("PEPE", dec!(1))]),
            FakeSource::boxed(Exchange::Binance, vec![("BTC", dec!(1)), ("ETH", dec!(1)), ("DOGE", dec!(1))]),
            FakeSource::failing(Exchange::BingX),
        ]);

        let report = feeds.symbol_overlap(Exchange::Mexc).await.unwrap();

        assert_eq!(report.reference_count, 3);
        assert_eq!(report.overlaps, vec![(Exchange::Binance, 3, 2)]);
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_symbol_overlap_unknown_reference() {
        let feeds = FeedSet::new(vec![FakeSource::boxed(Exchange::Binance, vec![])]);
        let err = feeds.symbol_overlap(Exchange::Mexc).await.unwrap_err();
        assert!(matches!(err, FeedError::UnsupportedExchange(_)));
    }

    #[test]
    fn test_from_exchanges_dedupes() {
        let client = RestClient::new(RestClient::DEFAULT_TIMEOUT).unwrap();
        let feeds = FeedSet::from_exchanges(&[Exchange::Mexc, Exchange::Okx, Exchange::Mexc], client);
        assert_eq!(feeds.exchanges(), vec![Exchange::Mexc, Exchange::Okx]);
        assert_eq!(feeds.len(), 2);
    }
}
