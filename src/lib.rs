// Watermark Bot - library entry point
// Settings, filter planning and the conversation core behind the chat bot.

pub mod constants;
pub mod error;
pub mod tools;
pub mod config;
pub mod settings;
pub mod db;
pub mod metadata;
pub mod render;
pub mod conversation;
pub mod watermarks;
pub mod jobs;
pub mod bot;

pub use bot::{Bot, Dispatch};
pub use config::BotConfig;
pub use error::{BotError, Result};
