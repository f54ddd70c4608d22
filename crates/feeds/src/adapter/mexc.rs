use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

pub struct MexcAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MexcResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<MexcTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MexcTicker {
    symbol: String,
    last_price: Option<RawDecimal>,
    fair_price: Option<RawDecimal>,
    funding_rate: Option<RawDecimal>,
    /// 24h turnover in USDT (`volume24` is in contracts)
    amount24: Option<RawDecimal>,
}

impl MexcAdapter {
    const BASE_URL: &'static str = "https://contract.mexc.com/api/v1";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_tickers(
        response: MexcResponse,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<PriceQuote>, FeedError> {
        if !response.success {
            return Err(FeedError::Api {
                code: response.code.to_string(),
                message: response.message.unwrap_or_default(),
            });
        }

        let quotes = response
            .data
            .into_iter()
            .filter(|t| t.symbol.ends_with("_USDT"))
            .filter_map(|t| {
                let symbol = Symbol::parse(&t.symbol)?;
                let price = positive(&[decimal(&t.fair_price), decimal(&t.last_price)])?;
                Some(PriceQuote::new(
                    Exchange::Mexc,
                    symbol,
                    price,
                    decimal(&t.amount24).unwrap_or_default(),
                    decimal(&t.funding_rate),
                    fetched_at,
                ))
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for MexcAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let url = format!("{}/contract/ticker", Self::BASE_URL);
        let response: MexcResponse = self.client.get_json(&url, &[]).await?;
        let quotes = Self::parse_tickers(response, Utc::now())?;
        debug!("MEXC: Loaded {} futures contracts", quotes.len());
        Ok(quotes)
    }
}
