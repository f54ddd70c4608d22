use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// OKX perpetual swaps.
///
/// The bulk ticker endpoint has no funding rate, and `volCcy24h` is in the
/// base currency, so volume is converted with the last price.
pub struct OkxAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OkxResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<OkxTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTicker {
    inst_id: String,
    last: Option<RawDecimal>,
    vol_ccy24h: Option<RawDecimal>,
}

impl OkxAdapter {
    const TICKERS_URL: &'static str = "https://www.okx.com/api/v5/market/tickers";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_tickers(
        response: OkxResponse,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<PriceQuote>, FeedError> {
        if response.code != "0" {
            return Err(FeedError::Api {
                code: response.code,
                message: response.msg,
            });
        }

        let quotes = response
            .data
            .into_iter()
            .filter(|t| t.inst_id.ends_with("-USDT-SWAP"))
            .filter_map(|t| {
                let symbol = Symbol::parse(&t.inst_id)?;
                let price = positive(&[decimal(&t.last)])?;
                let volume = decimal(&t.vol_ccy24h).unwrap_or_default().checked_mul(price)?;
                Some(PriceQuote::new(
                    Exchange::Okx,
                    symbol,
                    price,
                    volume,
                    None,
                    fetched_at,
                ))
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for OkxAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let response: OkxResponse = self
            .client
            .get_json(Self::TICKERS_URL, &[("instType", "SWAP")])
            .await?;
        let quotes = Self::parse_tickers(response, Utc::now())?;
        debug!("OKX: Loaded {} swaps", quotes.len());
        Ok(quotes)
    }
}
