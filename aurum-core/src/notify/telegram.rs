//! Telegram Bot API delivery.

use serde::Serialize;
use std::time::Duration;

use super::{format_crossover_message, Notifier, NotifyError};
use crate::config::TelegramConfig;
use crate::signal::CrossoverEvent;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Build from config, reading the token from `config.token_env`.
    /// Returns `Ok(None)` when Telegram is disabled.
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>, NotifyError> {
        if !config.enabled {
            return Ok(None);
        }
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NotifyError::MissingToken {
                env_var: config.token_env.clone(),
            })?;
        Self::new(token, config.chat_id.clone()).map(Some)
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.token)
    }

    pub fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };
        // The token is part of the URL; keep it out of error messages.
        let resp = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .map_err(|e| NotifyError::Delivery(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn notify(&self, event: &CrossoverEvent, label: &str) -> Result<(), NotifyError> {
        match format_crossover_message(event, label) {
            Some(text) => self.send_text(&text),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_builds_nothing() {
        let config = TelegramConfig::default();
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn missing_token_is_reported() {
        let config = TelegramConfig {
            enabled: true,
            chat_id: "12345".into(),
            token_env: "AURUM_TEST_TOKEN_THAT_IS_NEVER_SET".into(),
        };
        assert!(matches!(
            TelegramNotifier::from_config(&config),
            Err(NotifyError::MissingToken { .. })
        ));
    }

    #[test]
    fn payload_shape() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hi",
            parse_mode: "Markdown",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"chat_id": "42", "text": "hi", "parse_mode": "Markdown"})
        );
    }

    #[test]
    fn endpoint_embeds_token() {
        let n = TelegramNotifier::new("abc:123", "42").unwrap();
        assert_eq!(n.endpoint(), "https://api.telegram.org/botabc:123/sendMessage");
    }
}
