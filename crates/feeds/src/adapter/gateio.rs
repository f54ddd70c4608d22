use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// Gate.io USDT-settled perpetuals.
pub struct GateIOAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GateTicker {
    contract: String,
    mark_price: Option<RawDecimal>,
    last: Option<RawDecimal>,
    funding_rate: Option<RawDecimal>,
    volume_24h_quote: Option<RawDecimal>,
}

impl GateIOAdapter {
    const TICKERS_URL: &'static str = "https://api.gateio.ws/api/v4/futures/usdt/tickers";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_tickers(tickers: Vec<GateTicker>, fetched_at: DateTime<Utc>) -> Vec<PriceQuote> {
        tickers
            .into_iter()
            .filter(|t| t.contract.ends_with("_USDT"))
            .filter_map(|t| {
                let symbol = Symbol::parse(&t.contract)?;
                let price = positive(&[decimal(&t.mark_price), decimal(&t.last)])?;
                Some(PriceQuote::new(
                    Exchange::GateIO,
                    symbol,
                    price,
                    decimal(&t.volume_24h_quote).unwrap_or_default(),
                    decimal(&t.funding_rate),
                    fetched_at,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for GateIOAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::GateIO
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let tickers: Vec<GateTicker> = self.client.get_json(Self::TICKERS_URL, &[]).await?;
        let quotes = Self::parse_tickers(tickers, Utc::now());
        debug!("Gate: Loaded {} futures contracts", quotes.len());
        Ok(quotes)
    }
}
