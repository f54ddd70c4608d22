//! Telegram connection settings.

use serde::Deserialize;

/// Bot credentials and target chat.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
    /// Chat that receives alerts and may send commands
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
    /// Forum topic (`message_thread_id`) for alerts
    #[serde(alias = "message_thread_id")]
    pub topic_id: Option<i32>,
    /// Bot username, needed to accept `/command@bot` forms
    pub bot_username: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &if self.bot_token.is_empty() { "" } else { "<redacted>" })
            .field("chat_id", &self.chat_id)
            .field("topic_id", &self.topic_id)
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

impl TelegramConfig {
    pub const TOKEN_ENV: &'static str = "TELEGRAM_BOT_TOKEN";
    pub const CHAT_ID_ENV: &'static str = "TELEGRAM_CHAT_ID";

    /// Override token and chat id from `TELEGRAM_BOT_TOKEN` and
    /// `TELEGRAM_CHAT_ID` when set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(Self::TOKEN_ENV).ok(),
            std::env::var(Self::CHAT_ID_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, bot_token: Option<String>, chat_id: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.bot_token = token.trim().to_string();
        }
        if let Some(chat_id) = chat_id.filter(|c| !c.trim().is_empty()) {
            self.chat_id = chat_id.trim().to_string();
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

/// YAML chat ids are often written unquoted (`chat_id: -100123`).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
