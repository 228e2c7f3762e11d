use super::traits::{DocumentRelay, RelayError};
use crate::{config::BotToken, domain::submission::entity::RelayMessage};
use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use std::time::Duration;

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers documents through the Telegram Bot API `sendDocument` method.
pub struct TelegramRelay {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramRelay {
    pub fn new(
        api_base: &str,
        token: &BotToken,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build relay HTTP client: {}", e))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendDocument",
                api_base.trim_end_matches('/'),
                token.expose()
            ),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl DocumentRelay for TelegramRelay {
    async fn send_document(&self, message: &RelayMessage) -> Result<(), RelayError> {
        let document = &message.document;
        let bytes = tokio::fs::read(&document.path)
            .await
            .map_err(RelayError::Document)?;

        // The endpoint URL embeds the bot token, so it is stripped from every transport error.
        let part = Part::bytes(bytes)
            .file_name(document.original_name.clone())
            .mime_str(document.media_type.as_mime())
            .map_err(|e| RelayError::Transport(e.without_url()))?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", part)
            .text("caption", message.caption.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(e.without_url()))?;

        if !status.is_success() {
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        if let Ok(envelope) = serde_json::from_str::<TelegramResponse>(&body) {
            if !envelope.ok {
                return Err(RelayError::Rejected {
                    status: status.as_u16(),
                    body: envelope.description.unwrap_or(body),
                });
            }
        }

        tracing::info!(
            status = status.as_u16(),
            size_bytes = document.size_bytes,
            response = %body,
            "Telegram accepted document"
        );
        Ok(())
    }
}
