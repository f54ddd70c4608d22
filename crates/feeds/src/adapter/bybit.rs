use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// Bybit linear perpetuals (v5 market API).
pub struct BybitAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BybitResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<BybitResult>,
}

#[derive(Debug, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    symbol: String,
    mark_price: Option<RawDecimal>,
    last_price: Option<RawDecimal>,
    funding_rate: Option<RawDecimal>,
    turnover24h: Option<RawDecimal>,
}

impl BybitAdapter {
    const TICKERS_URL: &'static str = "https://api.bybit.com/v5/market/tickers";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_tickers(
        response: BybitResponse,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<PriceQuote>, FeedError> {
        if response.ret_code != 0 {
            return Err(FeedError::Api {
                code: response.ret_code.to_string(),
                message: response.ret_msg,
            });
        }

        let list = response.result.map(|r| r.list).unwrap_or_default();
        let quotes = list
            .into_iter()
            .filter(|t| t.symbol.ends_with("USDT"))
            .filter_map(|t| {
                let symbol = Symbol::parse(&t.symbol)?;
                let price = positive(&[decimal(&t.mark_price), decimal(&t.last_price)])?;
                Some(PriceQuote::new(
                    Exchange::Bybit,
                    symbol,
                    price,
                    decimal(&t.turnover24h).unwrap_or_default(),
                    decimal(&t.funding_rate),
                    fetched_at,
                ))
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for BybitAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let response: BybitResponse = self
            .client
            .get_json(Self::TICKERS_URL, &[("category", "linear")])
            .await?;
        let quotes = Self::parse_tickers(response, Utc::now())?;
        debug!("Bybit: Loaded {} linear perpetuals", quotes.len());
        Ok(quotes)
    }
}
