use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use std::collections::HashMap;
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// Binance USD-M futures. Mark price and funding come from `premiumIndex`,
/// quote volume from `ticker/24hr`.
pub struct BinanceAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BinancePremiumIndex {
    symbol: String,
    mark_price: Option<RawDecimal>,
    last_funding_rate: Option<RawDecimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BinanceTicker24h {
    symbol: String,
    last_price: Option<RawDecimal>,
    quote_volume: Option<RawDecimal>,
}

impl BinanceAdapter {
    const BASE_URL: &'static str = "https://fapi.binance.com/fapi/v1";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Join premium index entries with 24h tickers by symbol.
    /// Delivery contracts (`BTCUSDT_250328`) are skipped.
    pub(crate) fn parse_quotes(
        premium: Vec<BinancePremiumIndex>,
        tickers: Vec<BinanceTicker24h>,
        fetched_at: DateTime<Utc>,
    ) -> Vec<PriceQuote> {
        let tickers: HashMap<String, BinanceTicker24h> = tickers
            .into_iter()
            .map(|t| (t.symbol.clone(), t))
            .collect();

        premium
            .into_iter()
            .filter(|p| p.symbol.ends_with("USDT"))
            .filter_map(|p| {
                let symbol = Symbol::parse(&p.symbol)?;
                let ticker = tickers.get(&p.symbol);
                let last = ticker.and_then(|t| decimal(&t.last_price));
                let price = positive(&[decimal(&p.mark_price), last])?;
                let volume = ticker
                    .and_then(|t| decimal(&t.quote_volume))
                    .unwrap_or(Decimal::ZERO);

                Some(PriceQuote::new(
                    Exchange::Binance,
                    symbol,
                    price,
                    volume,
                    decimal(&p.last_funding_rate),
                    fetched_at,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let premium: Vec<BinancePremiumIndex> = self
            .client
            .get_json(&format!("{}/premiumIndex", Self::BASE_URL), &[])
            .await?;
        let tickers: Vec<BinanceTicker24h> = self
            .client
            .get_json(&format!("{}/ticker/24hr", Self::BASE_URL), &[])
            .await?;

        let quotes = Self::parse_quotes(premium, tickers, Utc::now());
        debug!("Binance: Loaded {} futures", quotes.len());
        Ok(quotes)
    }
}
