use anyhow::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt, future::Future, time::Duration};

const API_BASE_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Slack added on top of the long-poll window before the HTTP request itself
/// is abandoned.
const LONG_POLL_GRACE_SECS: u64 = 10;

/// Delivery failure classification. Permanent means the recipient is gone
/// for good (blocked the bot, chat deleted) and should be pruned; transient
/// covers everything else and keeps the recipient registered.
#[derive(Debug)]
pub enum SendError {
    Permanent(String),
    Transient(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Permanent(msg) => write!(f, "permanent delivery failure: {msg}"),
            SendError::Transient(msg) => write!(f, "transient delivery failure: {msg}"),
        }
    }
}

impl std::error::Error for SendError {}

/// Outbound side of the messaging gateway, kept as a trait so the dispatcher
/// can be exercised against a mock.
pub trait MessageGateway {
    fn send_message(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), SendError>> + Send;
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

/// Thin client for the Telegram Bot API.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, Error> {
        Self::with_base_url(token, API_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Long-polls for inbound updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, Error> {
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + LONG_POLL_GRACE_SECS))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }))
            .send()
            .await?
            .json::<ApiResponse<Vec<Update>>>()
            .await?;

        if !response.ok {
            anyhow::bail!(
                "getUpdates failed: {}",
                response.description.unwrap_or_default()
            );
        }
        Ok(response.result.unwrap_or_default())
    }

    /// Registers the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), Error> {
        let response = self
            .http
            .post(self.method_url("setMyCommands"))
            .json(&json!({ "commands": commands }))
            .send()
            .await?
            .json::<ApiResponse<bool>>()
            .await?;

        if !response.ok {
            anyhow::bail!(
                "setMyCommands failed: {}",
                response.description.unwrap_or_default()
            );
        }
        Ok(())
    }
}

impl MessageGateway for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| SendError::Transient(e.to_string()))?;

        let body = response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .map_err(|e| SendError::Transient(e.to_string()))?;

        if body.ok {
            return Ok(());
        }
        let description = body
            .description
            .unwrap_or_else(|| "unknown telegram error".to_string());
        // 403: bot blocked by the user, 400: chat not found
        match body.error_code {
            Some(400) | Some(403) => Err(SendError::Permanent(description)),
            _ => Err(SendError::Transient(description)),
        }
    }
}
