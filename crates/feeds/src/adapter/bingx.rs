use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// BingX perpetual swaps. No funding rate on the bulk ticker.
pub struct BingXAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BingXResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<BingXTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingXTicker {
    symbol: String,
    last_price: Option<RawDecimal>,
    quote_volume: Option<RawDecimal>,
}

impl BingXAdapter {
    const TICKER_URL: &'static str = "https://open-api.bingx.com/openApi/swap/v2/quote/ticker";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_tickers(
        response: BingXResponse,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<PriceQuote>, FeedError> {
        if response.code != 0 {
            return Err(FeedError::Api {
                code: response.code.to_string(),
                message: response.msg,
            });
        }

        let quotes = response
            .data
            .into_iter()
            .filter(|t| t.symbol.ends_with("-USDT"))
            .filter_map(|t| {
                let symbol = Symbol::parse(&t.symbol)?;
                let price = positive(&[decimal(&t.last_price)])?;
                Some(PriceQuote::new(
                    Exchange::BingX,
                    symbol,
                    price,
                    decimal(&t.quote_volume).unwrap_or_default(),
                    None,
                    fetched_at,
                ))
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for BingXAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::BingX
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let response: BingXResponse = self.client.get_json(Self::TICKER_URL, &[]).await?;
        let quotes = Self::parse_tickers(response, Utc::now())?;
        debug!("BingX: Loaded {} swaps", quotes.len());
        Ok(quotes)
    }
}
