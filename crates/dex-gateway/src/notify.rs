//! Notification delivery. Telegram in production, plain logging when no
//! credentials are configured. Callers treat every notifier as best-effort.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::traits::Notifier;
use serde_json::json;
use std::time::Duration;
use tracing::info;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build telegram http client")?;
        Ok(Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "https://api.telegram.org/bot{}/sendMessage",
                self.bot_token
            ))
            .json(&json!({
                "chat_id": self.chat_id,
                "text": message,
            }))
            .send()
            .await
            .context("telegram send failed")?;
        if !response.status().is_success() {
            bail!("telegram returned {}", response.status());
        }
        Ok(())
    }
}

/// Fallback notifier: writes the message to the log stream.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        info!(message, "notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_delivers() {
        LogNotifier.notify("order settled").await.unwrap();
    }
}
