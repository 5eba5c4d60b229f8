// Outbound side of the transport

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::settings::UserId;
use super::events::ChatId;
use super::menu::Keyboard;

/// Everything the bot can send back. Implemented by the transport.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()>;

    async fn send_menu(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()>;

    /// Upload a finished video. The file is deleted once this returns.
    async fn send_video(&self, chat: ChatId, path: &Path) -> Result<()>;

    /// Short acknowledgement of a button tap (toast or alert).
    async fn answer_callback(&self, user: UserId, text: &str, alert: bool) -> Result<()>;
}
