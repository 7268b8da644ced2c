//! Minimal Telegram Bot API client.
//!
//! Covers what a broadcast bot needs: sending and editing messages with
//! inline keyboards, acknowledging button presses, and long-polling updates.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub mod models;

use crate::models::{
    AnswerCallbackQueryParams, ApiResponse, EditMessageTextParams, GetUpdatesParams,
    InlineKeyboardMarkup, Message, SendMessageParams, Update,
};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Slack added on top of the long-poll timeout before the HTTP request gives up.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("request to Telegram failed: {0}")]
    Network(String),

    #[error("Telegram API error {code:?}: {description}")]
    Api {
        code: Option<i32>,
        description: String,
    },

    #[error("failed to parse Telegram response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    pub api_base: String,
}

impl TelegramOptions {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message> {
        let params = SendMessageParams {
            chat_id,
            text,
            disable_web_page_preview: true,
            reply_markup,
        };
        self.call("sendMessage", &params, REQUEST_TIMEOUT).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let params = EditMessageTextParams {
            chat_id,
            message_id,
            text,
            disable_web_page_preview: true,
            reply_markup,
        };
        // Answers with the edited Message, or `true` for inline messages
        self.call::<_, serde_json::Value>("editMessageText", &params, REQUEST_TIMEOUT)
            .await
            .map(|_| ())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let params = AnswerCallbackQueryParams { callback_query_id };
        self.call::<_, bool>("answerCallbackQuery", &params, REQUEST_TIMEOUT)
            .await
            .map(|_| ())
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message", "callback_query"],
        };
        let http_timeout = Duration::from_secs(timeout_secs) + LONG_POLL_GRACE;
        self.call("getUpdates", &params, http_timeout).await
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.options.api_base, self.options.bot_token, method
        );

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                warn!(method, error = %e, "Telegram request failed");
                TelegramError::Network(e.to_string())
            })?;

        // Telegram reports failures in the body with ok=false, even on 4xx
        let body: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| TelegramError::Parse(e.to_string()))?;

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TelegramError::Parse(format!(
                "{} returned ok without a result",
                method
            ))),
            (false, _) => Err(TelegramError::Api {
                code: body.error_code,
                description: body.description.unwrap_or_default(),
            }),
        }
    }
}
