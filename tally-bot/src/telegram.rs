//! Telegram Bot API client.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tally_analytics::ChartImage;
use tally_core::ChatId;

use crate::transport::{ChatTransport, InlineKeyboard, Update};

const API_BASE: &str = "https://api.telegram.org";

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build telegram http client")?;
        Ok(Self {
            http,
            base_url: format!("{API_BASE}/bot{token}"),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("telegram {method}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("read telegram {method} response"))?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body)
            .with_context(|| format!("parse telegram {method} response ({status})"))?;

        if !parsed.ok {
            bail!(
                "telegram {method} failed: {status} {}",
                parsed.description.unwrap_or_default()
            );
        }
        parsed
            .result
            .with_context(|| format!("telegram {method} returned no result"))
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut query = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let req = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&query)
            // leave headroom over the server-side long-poll window
            .timeout(Duration::from_secs(timeout_secs + 10));
        self.call("getUpdates", req).await
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(kb)?;
        }
        let req = self.http.post(self.method_url("sendMessage")).json(&body);
        let _: Value = self.call("sendMessage", req).await?;
        Ok(())
    }

    async fn send_image(
        &self,
        chat_id: ChatId,
        image: &ChartImage,
        caption: Option<&str>,
    ) -> Result<()> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime)
            .context("chart mime type")?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        // SVG is not accepted by sendPhoto, so charts go out as documents
        let req = self.http.post(self.method_url("sendDocument")).multipart(form);
        let _: Value = self.call("sendDocument", req).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let req = self
            .http
            .post(self.method_url("answerCallbackQuery"))
            .json(&json!({ "callback_query_id": callback_id }));
        let _: bool = self.call("answerCallbackQuery", req).await?;
        Ok(())
    }
}
