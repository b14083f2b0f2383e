use std::time::Duration;

use async_trait::async_trait;
use sw_core::client::{Notifier, NotifyError};
use sw_core::config::{Config, NotificationConfig};
use tracing::debug;

/// Sends HTML-formatted reports through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Resolve the bot token and chat id from the environment variables
    /// named in `config`.
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        let token = Config::secret(&config.telegram_token_env)
            .ok_or_else(|| NotifyError::NotConfigured(format!("{} is not set", config.telegram_token_env)))?;
        let chat_id = Config::secret(&config.telegram_chat_id_env).ok_or_else(|| {
            NotifyError::NotConfigured(format!("{} is not set", config.telegram_chat_id_env))
        })?;
        Self::new(
            &config.telegram_api_url,
            token,
            chat_id,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let resp = self
            .http
            .post(&url)
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(chat_id = %self.chat_id, bytes = text.len(), "telegram message delivered");
        Ok(())
    }
}
