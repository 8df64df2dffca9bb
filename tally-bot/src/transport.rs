//! Chat transport seam: inbound update shapes, keyboards, and the operations
//! the dispatcher needs from a messaging service.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_analytics::ChartImage;
use tally_core::ChatId;

/// One inbound event as delivered by `getUpdates`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Buttons attached under a message, one `Vec` per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// One button per row.
    pub fn column(buttons: &[(&str, &str)]) -> Self {
        Self {
            inline_keyboard: buttons
                .iter()
                .map(|(text, data)| {
                    vec![InlineButton {
                        text: text.to_string(),
                        callback_data: data.to_string(),
                    }]
                })
                .collect(),
        }
    }
}

/// Messaging operations used by the dispatcher.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates with id `>= offset`.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Send Markdown-formatted text, optionally with an inline keyboard.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    async fn send_image(
        &self,
        chat_id: ChatId,
        image: &ChartImage,
        caption: Option<&str>,
    ) -> Result<()>;

    /// Stop the client-side spinner on a pressed button.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}
