// Inbound events delivered by the transport layer

use std::path::PathBuf;

use crate::settings::UserId;

pub type ChatId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Slash command, name without the leading '/'
    Command { user: UserId, chat: ChatId, name: String },
    /// Video already downloaded to a temporary path owned by the bot from here on
    VideoUpload { user: UserId, chat: ChatId, path: PathBuf },
    /// Image to use as the user's watermark
    ImageUpload { user: UserId, chat: ChatId, path: PathBuf },
    /// Inline button tap with its opaque payload
    ButtonTap { user: UserId, chat: ChatId, payload: String },
    /// Free text that is not a command
    Text { user: UserId, chat: ChatId, text: String },
}

impl Event {
    /// Classify a typed message as a command or plain text.
    /// `/start@SomeBot arg` becomes the command `start`.
    pub fn from_message(user: UserId, chat: ChatId, text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('/') {
            let word = rest.split_whitespace().next().unwrap_or("");
            let name = word.split('@').next().unwrap_or("").to_lowercase();
            if !name.is_empty() {
                return Event::Command { user, chat, name };
            }
        }
        Event::Text { user, chat, text: text.to_string() }
    }

    pub fn user(&self) -> UserId {
        match self {
            Self::Command { user, .. }
            | Self::VideoUpload { user, .. }
            | Self::ImageUpload { user, .. }
            | Self::ButtonTap { user, .. }
            | Self::Text { user, .. } => *user,
        }
    }

    pub fn chat(&self) -> ChatId {
        match self {
            Self::Command { chat, .. }
            | Self::VideoUpload { chat, .. }
            | Self::ImageUpload { chat, .. }
            | Self::ButtonTap { chat, .. }
            | Self::Text { chat, .. } => *chat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            Event::from_message(1, 2, "/start"),
            Event::Command { user: 1, chat: 2, name: "start".to_string() }
        );
        assert_eq!(
            Event::from_message(1, 2, "/Settings@WatermarkBot now"),
            Event::Command { user: 1, chat: 2, name: "settings".to_string() }
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            Event::from_message(1, 2, "#FF0000"),
            Event::Text { user: 1, chat: 2, text: "#FF0000".to_string() }
        );
        // A lone slash is just text
        assert_eq!(
            Event::from_message(1, 2, "/"),
            Event::Text { user: 1, chat: 2, text: "/".to_string() }
        );
    }

    #[test]
    fn test_accessors() {
        let event = Event::ButtonTap { user: 3, chat: 4, payload: "settings".to_string() };
        assert_eq!(event.user(), 3);
        assert_eq!(event.chat(), 4);
    }
}
