//! Telegram Bot API transport.
//!
//! A thin client over the HTTPS Bot API plus the channel types the rest of
//! the crate speaks. Inbound traffic is distilled into [`TextEvent`]s (one
//! per text message with a known sender); outbound traffic is expressed as
//! [`OutgoingAction`]s pushed onto an mpsc channel and drained by the writer
//! task started with [`start_writer`]. The dispatch core never touches HTTP
//! directly, which keeps it testable by capturing the channel in tests.
//!
//! Delivery failures are terminal per action: sends are logged at warn and
//! dropped, message deletions are best-effort and logged at debug only.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Errors surfaced by Bot API calls.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Wrapper around reqwest transport/decode failures.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The outer watchdog timeout elapsed before the API answered.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The API answered with ok=false.
    #[error("api rejected {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

/// A Telegram update as returned by getUpdates. Only message updates are
/// requested; everything else deserializes with `message: None` and is
/// ignored upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One entry of the bot command menu registered via setMyCommands.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Inbound text message, reduced to what dispatch needs.
#[derive(Debug, Clone)]
pub struct TextEvent {
    /// Stable identity of the sender (Telegram user id).
    pub user_id: i64,
    /// Chat to reply into and delete from.
    pub chat_id: i64,
    /// Id of the triggering message within the chat.
    pub message_id: i64,
    pub content: String,
}

impl TextEvent {
    /// Distill an update into a text event. Updates without a sender or
    /// without text (joins, stickers, edits, ...) yield `None`.
    pub fn from_update(update: Update) -> Option<TextEvent> {
        let message = update.message?;
        let from = message.from?;
        let text = message.text?;
        Some(TextEvent {
            user_id: from.id,
            chat_id: message.chat.id,
            message_id: message.message_id,
            content: text,
        })
    }
}

/// Outbound transport work queued by the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingAction {
    SendText { chat_id: i64, text: String },
    /// Best-effort removal of a message (used to scrub submitted passwords).
    DeleteMessage { chat_id: i64, message_id: i64 },
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Minimal Bot API client. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    base_url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, request_timeout_seconds: u32) -> Self {
        Self {
            base_url: format!("https://api.telegram.org/bot{}", token),
            http: reqwest::Client::new(),
            request_timeout: Duration::from_secs(request_timeout_seconds as u64),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        payload: serde_json::Value,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/{}", self.base_url, method);
        let request = self.http.post(&url).json(&payload);

        let response = timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| TelegramError::Timeout(self.request_timeout.as_secs()))??;

        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api {
                method,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        envelope.result.ok_or(TelegramError::Api {
            method,
            description: "ok response without result".to_string(),
        })
    }

    /// Validate the token and fetch the bot's own account.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_seconds: u32,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            serde_json::json!({
                "offset": offset,
                "timeout": timeout_seconds,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: Message = self
            .call(
                "sendMessage",
                serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "deleteMessage",
                serde_json::json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    /// Publish the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "setMyCommands",
                serde_json::json!({ "commands": commands }),
            )
            .await?;
        Ok(())
    }
}

/// Spawn the writer task draining `rx` against the live API.
///
/// The task ends when every sender half of the channel is dropped.
pub fn start_writer(
    client: TelegramClient,
    mut rx: mpsc::UnboundedReceiver<OutgoingAction>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(action) = rx.recv().await {
            match action {
                OutgoingAction::SendText { chat_id, text } => {
                    if let Err(e) = client.send_message(chat_id, &text).await {
                        warn!("Failed to send message to chat {}: {}", chat_id, e);
                    }
                }
                OutgoingAction::DeleteMessage {
                    chat_id,
                    message_id,
                } => {
                    // Deletion is cosmetic cleanup; failure never reaches the user.
                    if let Err(e) = client.delete_message(chat_id, message_id).await {
                        debug!(
                            "Could not delete message {} in chat {}: {}",
                            message_id, chat_id, e
                        );
                    }
                }
            }
        }
        debug!("telegram writer task finished");
    })
}
