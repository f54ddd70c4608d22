use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spread_core::{Exchange, PriceQuote, Symbol};
use tracing::debug;

use super::{decimal, positive, QuoteSource, RawDecimal};
use crate::{FeedError, RestClient};

/// KuCoin futures. The active-contracts listing already carries mark price,
/// funding and 24h turnover, so one request covers the whole market.
pub struct KuCoinAdapter {
    client: RestClient,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KuCoinResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Vec<KuCoinContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KuCoinContract {
    symbol: String,
    #[serde(default)]
    base_currency: String,
    #[serde(default)]
    quote_currency: String,
    mark_price: Option<RawDecimal>,
    last_trade_price: Option<RawDecimal>,
    funding_fee_rate: Option<RawDecimal>,
    turnover_of24h: Option<RawDecimal>,
}

/// KuCoin lists bitcoin as XBT.
fn normalize_base(base: &str) -> &str {
    match base {
        "XBT" => "BTC",
        other => other,
    }
}

impl KuCoinAdapter {
    const CONTRACTS_URL: &'static str = "https://api-futures.kucoin.com/api/v1/contracts/active";
    const OK: &'static str = "200000";

    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub(crate) fn parse_contracts(
        response: KuCoinResponse,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<PriceQuote>, FeedError> {
        if response.code != Self::OK {
            return Err(FeedError::Api {
                code: response.code,
                message: response.msg.unwrap_or_default(),
            });
        }

        let quotes = response
            .data
            .into_iter()
            .filter(|c| c.quote_currency == "USDT" && c.symbol.ends_with("USDTM"))
            .filter_map(|c| {
                let symbol = Symbol::new(normalize_base(&c.base_currency))?;
                let price = positive(&[decimal(&c.mark_price), decimal(&c.last_trade_price)])?;
                Some(PriceQuote::new(
                    Exchange::KuCoin,
                    symbol,
                    price,
                    decimal(&c.turnover_of24h).unwrap_or_default(),
                    decimal(&c.funding_fee_rate),
                    fetched_at,
                ))
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for KuCoinAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::KuCoin
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>, FeedError> {
        let response: KuCoinResponse = self.client.get_json(Self::CONTRACTS_URL, &[]).await?;
        let quotes = Self::parse_contracts(response, Utc::now())?;
        debug!("KuCoin: Loaded {} active contracts", quotes.len());
        Ok(quotes)
    }
}
