use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{KeyboardMarkup, Transport, TransportError, Update};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Timeout for calls that are not long polls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a KeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
}

/// Bot API client over reqwest.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        method: &'static str,
        body: &B,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
            // The URL carries the bot token; keep it out of logs.
            .map_err(|e| TransportError::Http {
                method,
                source: e.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                method,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn fetch_updates(
        &self,
        offset: i64,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TransportError> {
        const METHOD: &str = "getUpdates";

        let response = self
            .client
            .get(self.method_url(METHOD))
            .query(&[("offset", offset), ("timeout", i64::from(timeout_secs))])
            .timeout(Duration::from_secs(u64::from(timeout_secs)) + REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| TransportError::Http {
                method: METHOD,
                source: e.without_url(),
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| TransportError::Http {
            method: METHOD,
            source: e.without_url(),
        })?;

        let body: ApiResponse<Vec<Update>> = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Status {
                    method: METHOD,
                    status: status.as_u16(),
                    body: raw,
                });
            }
            Err(source) => {
                return Err(TransportError::Decode {
                    method: METHOD,
                    source,
                });
            }
        };

        if !body.ok || !status.is_success() {
            return Err(TransportError::Api {
                method: METHOD,
                description: body
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            });
        }

        let updates = body.result.unwrap_or_default();
        debug!("getUpdates(offset={}) returned {} update(s)", offset, updates.len());
        Ok(updates)
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&KeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup: markup,
        };
        self.post_json("sendMessage", &request).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        let request = AnswerCallbackRequest {
            callback_query_id: callback_id,
        };
        self.post_json("answerCallbackQuery", &request).await
    }
}
