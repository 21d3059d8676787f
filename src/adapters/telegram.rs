//! Telegram Bot API implementation of the chat transport.
//!
//! Media arrives as Telegram file references; transcripts go back as
//! document replies anchored to the originating message. A self-hosted
//! Bot API server can be targeted via the base URL (the hosted API caps
//! download sizes).

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::ChatTransport;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client
pub struct TelegramClient {
    /// Bot token
    bot_token: String,
    /// API server base URL (no trailing slash)
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response envelope from the Bot API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.ok {
            anyhow::bail!(
                "Telegram API error: {}",
                self.description.unwrap_or_default()
            );
        }
        self.result.context("Telegram API returned empty result")
    }
}

/// Message result from sendMessage/sendDocument
#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// File metadata from getFile
#[derive(Debug, Deserialize)]
struct FileResult {
    file_path: Option<String>,
}

/// Configuration for the Telegram transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Override for a self-hosted Bot API server
    pub api_base_url: Option<String>,
}

impl TelegramClient {
    pub fn new(bot_token: String, api_base_url: Option<String>) -> Self {
        let api_base = api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            bot_token,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: TelegramConfig) -> Self {
        Self::new(config.bot_token, config.api_base_url)
    }

    /// Build a method URL
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Build a file-download URL
    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to call Telegram {method}"))?;

        let result: TelegramResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {method} response"))?;

        result.into_result()
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn download(&self, file_ref: &str, destination: &Path) -> Result<()> {
        let file: FileResult = self
            .call("getFile", serde_json::json!({ "file_id": file_ref }))
            .await?;
        let file_path = file
            .file_path
            .context("Telegram getFile returned no file_path")?;

        let mut response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .context("Failed to fetch Telegram file")?
            .error_for_status()
            .context("Telegram file download failed")?;

        let mut out = tokio::fs::File::create(destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        Ok(())
    }

    async fn send_reply(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        reply_to: i64,
        text: &str,
    ) -> Result<i64> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "reply_to_message_id": reply_to,
        });
        if let Some(thread_id) = thread_id {
            body["message_thread_id"] = thread_id.into();
        }

        let result: MessageResult = self.call("sendMessage", body).await?;
        Ok(result.message_id)
    }

    async fn send_document(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        reply_to: i64,
        path: &Path,
    ) -> Result<i64> {
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let file_bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file_part = Part::bytes(file_bytes).file_name(file_name);

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("reply_to_message_id", reply_to.to_string())
            .part("document", file_part);
        if let Some(thread_id) = thread_id {
            form = form.text("message_thread_id", thread_id.to_string());
        }

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .context("Failed to send Telegram document")?;

        let result: TelegramResponse<MessageResult> = response
            .json()
            .await
            .context("Failed to parse Telegram sendDocument response")?;

        Ok(result.into_result()?.message_id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = TelegramClient::new("TOKEN".to_string(), None);
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/botTOKEN/sendMessage"
        );
    }

    #[test]
    fn test_custom_api_base_trims_slash() {
        let client =
            TelegramClient::new("TOKEN".to_string(), Some("http://localhost:8081/".to_string()));
        assert_eq!(
            client.file_url("documents/file_0.mp3"),
            "http://localhost:8081/file/botTOKEN/documents/file_0.mp3"
        );
    }
}
