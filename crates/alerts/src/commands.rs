//! Chat commands received through `getUpdates` polling.

use crate::telegram::{ChatTransport, TelegramError};
use std::sync::Arc;
use teloxide::types::{Update, UpdateKind};
use teloxide::utils::command::BotCommands;
use tracing::debug;

/// Bot commands.
#[derive(BotCommands, Debug, Clone, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Stop alerts for a symbol. Usage: /blacklist PEPE (no argument lists it)")]
    Blacklist(String),
    #[command(description = "Show help")]
    Help,
}

impl Command {
    pub fn help_text() -> String {
        Command::descriptions().to_string()
    }
}

/// Tracks the `getUpdates` offset and turns messages from the configured
/// chat into [`Command`]s.
pub struct CommandPoller {
    transport: Arc<dyn ChatTransport>,
    chat_id: String,
    bot_username: String,
    offset: Option<u32>,
}

impl CommandPoller {
    /// Long-poll timeout passed to `getUpdates`.
    pub const POLL_TIMEOUT_SECS: u32 = 1;

    pub fn new(
        transport: Arc<dyn ChatTransport>,
        chat_id: impl Into<String>,
        bot_username: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            bot_username: bot_username.into(),
            offset: None,
        }
    }

    /// Next update id to request.
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Fetch pending updates and return the commands among them. The offset
    /// advances past every update seen, commands or not.
    pub async fn poll(&mut self) -> Result<Vec<Command>, TelegramError> {
        let updates = self
            .transport
            .get_updates(self.offset, Self::POLL_TIMEOUT_SECS)
            .await?;

        let mut commands = Vec::new();
        for update in &updates {
            let next = update.id.0.saturating_add(1);
            self.offset = Some(self.offset.map_or(next, |o| o.max(next)));
            if let Some(command) = self.parse_update(update) {
                commands.push(command);
            }
        }
        Ok(commands)
    }

    /// Command carried by `update`, if it is a known command from the
    /// configured chat.
    pub fn parse_update(&self, update: &Update) -> Option<Command> {
        let UpdateKind::Message(message) = &update.kind else {
            return None;
        };
        if message.chat.id.0.to_string() != self.chat_id.trim() {
            debug!(chat_id = message.chat.id.0, "Ignoring message from other chat");
            return None;
        }
        let text = message.text()?;
        Command::parse(text, &self.bot_username).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::OutgoingMessage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedUpdates {
        updates: Vec<Update>,
        offsets: Mutex<Vec<Option<u32>>>,
    }

    #[async_trait]
    impl ChatTransport for ScriptedUpdates {
        async fn send_message(&self, _: &OutgoingMessage) -> Result<(), TelegramError> {
            Ok(())
        }

        async fn get_updates(&self, offset: Option<u32>, _: u32) -> Result<Vec<Update>, TelegramError> {
            self.offsets.lock().unwrap().push(offset);
            Ok(self
                .updates
                .iter()
                .filter(|u| offset.map_or(true, |o| u.id.0 >= o))
                .cloned()
                .collect())
        }
    }

    fn message_update(update_id: u32, chat_id: i64, message: serde_json::Value) -> Update {
        let mut message = message;
        message["message_id"] = json!(update_id * 10);
        message["date"] = json!(1_700_000_000);
        message["chat"] = json!({"id": chat_id, "first_name": "Ann", "type": "private"});
        message["from"] = json!({"id": chat_id, "is_bot": false, "first_name": "Ann"});
        serde_json::from_value(json!({"update_id": update_id, "message": message})).unwrap()
    }

    fn update(update_id: u32, chat_id: i64, text: &str) -> Update {
        message_update(update_id, chat_id, json!({"text": text}))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/blacklist PEPE", "").unwrap(),
            Command::Blacklist("PEPE".to_string())
        );
        assert_eq!(Command::parse("/help", "").unwrap(), Command::Help);
        assert_eq!(
            Command::parse("/blacklist@spread_bot DOGE", "spread_bot").unwrap(),
            Command::Blacklist("DOGE".to_string())
        );
        assert!(Command::parse("hello", "").is_err());
        assert!(Command::parse("/unknown", "").is_err());
    }

    #[test]
    fn test_help_text_lists_commands() {
        let help = Command::help_text();
        assert!(help.contains("/blacklist"));
        assert!(help.contains("/help"));
    }

    #[tokio::test]
    async fn test_poll_filters_chat_and_advances_offset() {
        let transport = Arc::new(ScriptedUpdates {
            updates: vec![
                update(100, 42, "/blacklist pepe"),
                update(101, 999, "/blacklist BTC"),
                update(102, 42, "just chatting"),
                update(103, 42, "/help"),
            ],
            offsets: Mutex::new(Vec::new()),
        });
        let mut poller = CommandPoller::new(transport.clone(), "42", "");

        let commands = poller.poll().await.unwrap();
        assert_eq!(
            commands,
            vec![Command::Blacklist("pepe".to_string()), Command::Help]
        );
        assert_eq!(poller.offset(), Some(104));

        // nothing new after the offset
        assert!(poller.poll().await.unwrap().is_empty());
        assert_eq!(*transport.offsets.lock().unwrap(), vec![None, Some(104)]);
    }

    #[test]
    fn test_update_without_text_ignored() {
        let transport = Arc::new(ScriptedUpdates {
            updates: Vec::new(),
            offsets: Mutex::new(Vec::new()),
        });
        let poller = CommandPoller::new(transport, "42", "");
        let location = message_update(
            1,
            42,
            json!({"location": {"latitude": 51.5, "longitude": -0.12}}),
        );
        let edited: Update = serde_json::from_value(json!({
            "update_id": 2,
            "edited_message": {
                "message_id": 20,
                "date": 1_700_000_000,
                "edit_date": 1_700_000_100,
                "chat": {"id": 42, "first_name": "Ann", "type": "private"},
                "text": "/help"
            }
        }))
        .unwrap();

        assert_eq!(poller.parse_update(&location), None);
        assert_eq!(poller.parse_update(&edited), None);
    }
}
