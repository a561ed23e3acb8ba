//! Chat transport: inbound update polling and outbound messaging against a
//! Telegram-style Bot API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport API error: {status} - {description}")]
    Api { status: u16, description: String },

    #[error("Transport request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Artifact read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("File path missing in transport response")]
    MissingFilePath,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    /// Thumbnail ladder for a photo message; the last entry is the largest.
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// One row-major inline keyboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    #[must_use]
    pub const fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    /// Empty keyboard, used to strip buttons from an edited message.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            inline_keyboard: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    #[must_use]
    pub fn new(text: &str, callback_data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: callback_data.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Everything the bot needs from the chat platform, as a seam so tests can
/// substitute a recording double.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError>;

    /// Returns the id of the sent message.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, TransportError>;

    async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<i64, TransportError>;

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TransportError>;

    async fn edit_message_with_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), TransportError>;

    /// Acknowledges a button press; `alert` pops a modal notice instead of a
    /// silent ack.
    async fn answer_callback(
        &self,
        callback_id: &str,
        alert: Option<&str>,
    ) -> Result<(), TransportError>;

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;

    /// Streams a media attachment by its opaque reference into memory.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError>;

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<(), TransportError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    file_base: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::builder()
                // Long polling holds the connection open for the poll window.
                .timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            api_base: format!("https://api.telegram.org/bot{token}"),
            file_base: format!("https://api.telegram.org/file/bot{token}"),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &impl Serialize,
    ) -> Result<T, TransportError> {
        let url = format!("{}/{}", self.api_base, method);
        let response = self.client.post(&url).json(params).send().await?;

        let status = response.status().as_u16();
        let body: ApiResponse<T> = response.json().await?;

        if !body.ok {
            return Err(TransportError::Api {
                status: body.error_code.unwrap_or(status),
                description: body
                    .description
                    .unwrap_or_else(|| "unknown transport error".to_string()),
            });
        }

        body.result.ok_or(TransportError::Api {
            status,
            description: "missing result payload".to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, TransportError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<i64, TransportError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": keyboard,
                }),
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    async fn edit_message_with_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                    "reply_markup": keyboard,
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        alert: Option<&str>,
    ) -> Result<(), TransportError> {
        let params = match alert {
            Some(text) => serde_json::json!({
                "callback_query_id": callback_id,
                "text": text,
                "show_alert": true,
            }),
            None => serde_json::json!({ "callback_query_id": callback_id }),
        };
        let _: serde_json::Value = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "video.mp4".to_string(), |n| n.to_string_lossy().to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "video",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let url = format!("{}/sendVideo", self.api_base);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status().as_u16();
        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if !body.ok {
            return Err(TransportError::Api {
                status: body.error_code.unwrap_or(status),
                description: body
                    .description
                    .unwrap_or_else(|| "video delivery rejected".to_string()),
            });
        }

        debug!(chat_id, "video delivered");
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "deleteMessage",
                &serde_json::json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let info: FileInfo = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file_path = info.file_path.ok_or(TransportError::MissingFilePath)?;

        let url = format!("{}/{}", self.file_base, file_path);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Api {
                status: response.status().as_u16(),
                description: "file download failed".to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call("setMyCommands", &serde_json::json!({ "commands": commands }))
            .await?;
        Ok(())
    }
}
