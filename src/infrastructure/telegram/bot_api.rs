use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Extra time on top of the long-poll timeout before the HTTP request itself gives up.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request {method} failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("telegram rejected {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
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
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Minimal Telegram Bot API client built on reqwest.
pub struct TelegramClient {
    http: reqwest::Client,
    bot_url: Url,
}

impl TelegramClient {
    pub fn new(api_base_url: &Url, bot_token: &str, poll_timeout: Duration) -> Result<Self> {
        let mut bot_url = api_base_url.clone();
        match bot_url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push(&format!("bot{bot_token}"));
            }
            Err(()) => bail!("telegram API base URL {api_base_url} cannot carry a path"),
        }

        let http = reqwest::Client::builder()
            .timeout(poll_timeout + REQUEST_TIMEOUT_MARGIN)
            .build()?;

        Ok(Self { http, bot_url })
    }

    async fn call<P, T>(&self, method: &'static str, params: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self.bot_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(method);
        }

        // Telegram answers errors with a JSON body as well, so the status code is not checked.
        let resp: ApiResponse<T> = self
            .http
            .post(url)
            .json(params)
            .send()
            .await
            .map_err(|source| TelegramError::Transport { method, source })?
            .json()
            .await
            .map_err(|source| TelegramError::Transport { method, source })?;

        match (resp.ok, resp.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                method,
                description: resp
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdatesRequest {
                    offset,
                    timeout: timeout_secs,
                    allowed_updates: &["message", "callback_query"],
                },
            )
            .await?;

        debug!(count = updates.len(), "telegram: updates received");
        Ok(updates)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        self.call::<_, serde_json::Value>(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                reply_markup,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        self.call::<_, serde_json::Value>(
            "editMessageText",
            &EditMessageTextRequest {
                chat_id,
                message_id,
                text,
                reply_markup,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), TelegramError> {
        self.call::<_, serde_json::Value>(
            "answerCallbackQuery",
            &AnswerCallbackQueryRequest { callback_query_id },
        )
        .await?;
        Ok(())
    }
}
