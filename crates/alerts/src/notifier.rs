//! Alert notification logic.

use crate::telegram::{ChatTransport, OutgoingMessage, TelegramError};
use rust_decimal::Decimal;
use spread_core::{Exchange, SpreadOpportunity, Symbol};
use std::sync::Arc;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;
use tracing::{error, info};
use url::Url;

/// Configuration for the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifierConfig {
    /// Target chat id (numeric id or `@channel`).
    pub chat_id: String,
    /// Forum topic to post into, if any.
    pub topic_id: Option<i32>,
    /// Base of the trade button link; the MEXC contract code is appended.
    pub trade_url_base: String,
}

impl NotifierConfig {
    pub const TRADE_URL_BASE: &'static str = "https://www.mexc.com/exchange";
    pub const BUTTON_TEXT: &'static str = "Open App";

    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic_id: Option<i32>) -> Self {
        self.topic_id = topic_id;
        self
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            chat_id: String::new(),
            topic_id: None,
            trade_url_base: Self::TRADE_URL_BASE.to_string(),
        }
    }
}

/// Sends spread alerts and plain notices to the configured chat.
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>, config: NotifierConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Link opened by the alert button, e.g.
    /// `https://www.mexc.com/exchange/BTC_USDT`.
    pub fn trade_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/{}",
            self.config.trade_url_base.trim_end_matches('/'),
            symbol.mexc_contract()
        )
    }

    /// Build the alert message with its "Open App" button. Fails only if
    /// `trade_url_base` does not form a valid URL.
    pub fn opportunity_message(&self, opp: &SpreadOpportunity) -> Result<OutgoingMessage, TelegramError> {
        let url = Url::parse(&self.trade_url(&opp.symbol))?;
        let button = InlineKeyboardButton::url(NotifierConfig::BUTTON_TEXT, url);
        Ok(self
            .message(format_alert_message(opp))
            .with_keyboard(InlineKeyboardMarkup::new([[button]])))
    }

    /// Send an alert for `opp`. Failures are logged and returned; the caller
    /// decides whether to record a cooldown.
    pub async fn send_opportunity(&self, opp: &SpreadOpportunity) -> Result<(), TelegramError> {
        let result = match self.opportunity_message(opp) {
            Ok(message) => self.transport.send_message(&message).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!(
                    symbol = %opp.symbol,
                    long = %opp.long_exchange,
                    short = %opp.short_exchange,
                    spread = %opp.spread_percent.round_dp(2),
                    quality = opp.quality_score,
                    "Alert sent"
                );
                Ok(())
            }
            Err(e) => {
                error!(symbol = %opp.symbol, "Failed to send alert: {}", e);
                Err(e)
            }
        }
    }

    /// Send an HTML notice (command replies, startup).
    pub async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        self.transport.send_message(&self.message(text.to_string())).await
    }

    pub async fn send_startup(
        &self,
        min_spread_percent: Decimal,
        exchanges: &[Exchange],
    ) -> Result<(), TelegramError> {
        self.send_text(&format_startup_message(min_spread_percent, exchanges))
            .await
    }

    fn message(&self, text: String) -> OutgoingMessage {
        OutgoingMessage::html(self.config.chat_id.clone(), text).in_topic(self.config.topic_id)
    }
}

/// Format price with appropriate precision based on magnitude.
pub fn format_price(price: Decimal) -> String {
    if price.is_zero() {
        return "$0".to_string();
    }
    let abs_price = price.abs();
    if abs_price >= Decimal::from(1000) {
        format!("${:.2}", price)
    } else if abs_price >= Decimal::ONE {
        format!("${:.4}", price)
    } else if abs_price >= Decimal::new(1, 2) {
        format!("${:.6}", price)
    } else if abs_price >= Decimal::new(1, 4) {
        format!("${:.8}", price)
    } else {
        format!("${:.10}", price)
    }
}

/// 24h volume in millions, e.g. `$1.25M`.
pub fn format_volume(volume: Decimal) -> String {
    format!("${:.2}M", volume / Decimal::from(1_000_000))
}

/// Format an opportunity as an alert message.
pub fn format_alert_message(opp: &SpreadOpportunity) -> String {
    let funding = match opp.funding_rate_percent() {
        Some(rate) => format!("{:.4}%", rate),
        None => "n/a".to_string(),
    };

    format!(
        "🚨 <b>{}</b> spread <b>{:.2}%</b>\n\n\
         📈 <b>Long:</b> {} @ {}\n\
         📉 <b>Short:</b> {} @ {}\n\n\
         <b>Volume 24h:</b> {}\n\
         <b>Funding:</b> {}\n\
         <b>Quality:</b> {}/100\n\n\
         ⏰ {}",
        escape(&opp.symbol.to_string()),
        opp.spread_percent,
        opp.long_exchange,
        format_price(opp.long_price),
        opp.short_exchange,
        format_price(opp.short_price),
        format_volume(opp.volume_24h),
        funding,
        opp.quality_score,
        opp.detected_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub fn format_startup_message(min_spread_percent: Decimal, exchanges: &[Exchange]) -> String {
    let names: Vec<&str> = exchanges.iter().map(|e| e.as_str()).collect();
    format!(
        "✅ <b>Spread monitor started</b>\nMin spread: {}%\nExchanges: {}",
        min_spread_percent.normalize(),
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError> {
            if self.fail {
                return Err(TelegramError::Api(teloxide::RequestError::Api(
                    teloxide::ApiError::BotBlocked,
                )));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_updates(
            &self,
            _: Option<u32>,
            _: u32,
        ) -> Result<Vec<teloxide::types::Update>, TelegramError> {
            Ok(Vec::new())
        }
    }

    fn opportunity() -> SpreadOpportunity {
        SpreadOpportunity {
            symbol: Symbol::new("BTC").unwrap(),
            long_exchange: Exchange::Binance,
            long_price: dec!(100),
            short_exchange: Exchange::Mexc,
            short_price: dec!(109),
            spread_percent: dec!(9),
            quality_score: 42,
            funding_rate: Some(dec!(0.001)),
            volume_24h: dec!(1000000),
            detected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_notifier_config_default() {
        let config = NotifierConfig::default();
        assert_eq!(config.trade_url_base, "https://www.mexc.com/exchange");
        assert_eq!(config.topic_id, None);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(0)), "$0");
        assert_eq!(format_price(dec!(63000.123)), "$63000.12");
        assert_eq!(format_price(dec!(2.5)), "$2.5000");
        assert_eq!(format_price(dec!(0.05)), "$0.050000");
        assert_eq!(format_price(dec!(0.00001234)), "$0.0000123400");
    }

    #[test]
    fn test_format_alert_message() {
        let text = format_alert_message(&opportunity());
        assert!(text.contains("<b>BTC/USDT</b> spread <b>9.00%</b>"));
        assert!(text.contains("<b>Long:</b> Binance @ $100.0000"));
        assert!(text.contains("<b>Short:</b> MEXC @ $109.0000"));
        assert!(text.contains("<b>Volume 24h:</b> $1.00M"));
        assert!(text.contains("<b>Funding:</b> 0.1000%"));
        assert!(text.contains("<b>Quality:</b> 42/100"));
        assert!(text.ends_with("2024-05-01 12:30:00 UTC"));
    }

    #[test]
    fn test_unknown_funding_shown_as_na() {
        let mut opp = opportunity();
        opp.funding_rate = None;
        assert!(format_alert_message(&opp).contains("<b>Funding:</b> n/a"));
    }

    #[tokio::test]
    async fn test_send_opportunity_with_button_and_topic() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(
            transport.clone(),
            NotifierConfig::new("-100123").with_topic(Some(7)),
        );

        notifier.send_opportunity(&opportunity()).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, "-100123");
        assert_eq!(sent[0].message_thread_id, Some(7));
        let url = Url::parse("https://www.mexc.com/exchange/BTC_USDT").unwrap();
        assert_eq!(
            sent[0].reply_markup,
            Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::url("Open App", url)]]))
        );
    }

    #[tokio::test]
    async fn test_bad_trade_url_base_is_an_error() {
        let transport = Arc::new(RecordingTransport::default());
        let mut config = NotifierConfig::new("1");
        config.trade_url_base = "not a url".into();
        let notifier = Notifier::new(transport.clone(), config);

        let err = notifier.send_opportunity(&opportunity()).await.unwrap_err();
        assert!(matches!(err, TelegramError::InvalidUrl(_)));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_returned() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let notifier = Notifier::new(transport, NotifierConfig::new("1"));

        assert!(notifier.send_opportunity(&opportunity()).await.is_err());
    }

    #[tokio::test]
    async fn test_send_startup() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), NotifierConfig::new("1"));

        notifier
            .send_startup(dec!(3.0), &[Exchange::Mexc, Exchange::GateIO])
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert!(sent[0].text.contains("Min spread: 3%"));
        assert!(sent[0].text.contains("Exchanges: MEXC, Gate"));
        assert_eq!(sent[0].reply_markup, None);
    }
}
