//! Telegram delivery over `teloxide`.
//!
//! [`ChatTransport`] is the seam between the monitor and the Bot API:
//! [`TelegramApi`] implements it on a `teloxide::Bot`, tests swap in fakes.

use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, InlineKeyboardMarkup, MessageId, ParseMode, Recipient, ThreadId, Update,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Failed to build Telegram client: {0}")]
    Client(String),
    #[error("Invalid button URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// An HTML message waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    /// Numeric chat id or `@channel` username
    pub chat_id: String,
    /// Forum topic
    pub message_thread_id: Option<i32>,
    pub text: String,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    /// HTML message without a keyboard.
    pub fn html(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_thread_id: None,
            text: text.into(),
            reply_markup: None,
        }
    }

    pub fn in_topic(mut self, topic_id: Option<i32>) -> Self {
        self.message_thread_id = topic_id;
        self
    }

    pub fn with_keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

/// Chat delivery and command intake.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError>;

    /// Long-poll for updates with id `offset` or newer.
    async fn get_updates(
        &self,
        offset: Option<u32>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TelegramError>;
}

/// Bot API client.
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    /// `timeout` must exceed the `getUpdates` long-poll timeout.
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self, TelegramError> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| TelegramError::Client(e.to_string()))?;
        Ok(Self {
            bot: Bot::with_client(bot_token, client),
        })
    }
}

/// `-100123` addresses a chat by id, anything else is a channel username.
fn recipient(chat_id: &str) -> Recipient {
    match chat_id.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.trim().to_string()),
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TelegramError> {
        let mut request = self
            .bot
            .send_message(recipient(&message.chat_id), message.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(thread_id) = message.message_thread_id {
            request = request.message_thread_id(ThreadId(MessageId(thread_id)));
        }
        if let Some(markup) = message.reply_markup.clone() {
            request = request.reply_markup(markup);
        }
        request.await?;
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<u32>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut request = self
            .bot
            .get_updates()
            .timeout(timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message]);
        if let Some(offset) = offset {
            request = request.offset(i32::try_from(offset).unwrap_or(i32::MAX));
        }
        Ok(request.await?)
    }
}
