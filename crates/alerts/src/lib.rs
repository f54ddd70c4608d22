//! Telegram alerting for spread opportunities.
//!
//! This crate provides:
//! - Bot API transport on `teloxide` (`sendMessage`, `getUpdates`)
//! - Alert formatting and delivery with an inline trade button
//! - `/blacklist` and `/help` command polling
//! - A JSON-file backed symbol blacklist

pub mod blacklist;
pub mod commands;
pub mod config;
pub mod notifier;
pub mod telegram;

pub use blacklist::{BlacklistError, BlacklistStore};
pub use commands::{Command, CommandPoller};
pub use config::TelegramConfig;
pub use notifier::{format_alert_message, format_price, Notifier, NotifierConfig};
pub use telegram::{ChatTransport, OutgoingMessage, TelegramApi, TelegramError};
pub use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardButtonKind, InlineKeyboardMarkup, Update,
};
pub use teloxide::utils::html::escape as escape_html;
