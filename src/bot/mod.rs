// Bot dispatcher
// Routes transport events to settings, menus, the conversation machine and jobs.

pub mod auth;
pub mod events;
pub mod menu;
pub mod responder;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::BotConfig;
use crate::conversation::{Conversation, InputOutcome, PendingInput};
use crate::db::schema::SqliteSettingsStore;
use crate::error::{BotError, Result};
use crate::jobs::cleanup::TempFiles;
use crate::jobs::{run_watermark_job, JobOutcome, JobRequest, JobServices, MSG_PROCESSING};
use crate::metadata::ffprobe::FfprobeProbe;
use crate::render::FfmpegEncoder;
use crate::settings::UserId;
use crate::watermarks::WatermarkLibrary;
use auth::{gate_for, MembershipCheck};
use events::{ChatId, Event};
use menu::{Menu, MenuAction};
use responder::Responder;

pub const MSG_SUBSCRIBE: &str = "Subscribe first!";
pub const MSG_SETTINGS_HINT: &str = "/settings to view.";
pub const MSG_IMAGE_SAVED: &str = "Watermark image saved. It will be used on your next video.";

/// What happened to an event.
#[derive(Debug)]
pub enum Dispatch {
    Handled,
    /// Not for us (idle text, unknown command or payload)
    Ignored,
    /// A watermark job was spawned for a video upload
    JobStarted(JoinHandle<JobOutcome>),
}

pub struct Bot {
    services: Arc<JobServices>,
    conversation: Conversation,
    membership: Box<dyn MembershipCheck>,
    responder: Arc<dyn Responder>,
}

impl Bot {
    pub fn new(
        services: Arc<JobServices>,
        membership: Box<dyn MembershipCheck>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            services,
            conversation: Conversation::new(),
            membership,
            responder,
        }
    }

    /// Wire the production collaborators from a config.
    pub fn from_config(config: &BotConfig, responder: Arc<dyn Responder>) -> Result<Self> {
        config.ensure_dirs()?;
        let store = SqliteSettingsStore::open(&config.db_path())?;

        let services = JobServices {
            store: Arc::new(store),
            probe: Arc::new(FfprobeProbe::new(&config.ffprobe_path)),
            encoder: Arc::new(FfmpegEncoder::new(&config.ffmpeg_path)),
            watermarks: WatermarkLibrary::new(config.watermarks_dir()),
            font_path: config.font_path.clone(),
            preset: config.preset.clone(),
            work_dir: config.work_dir(),
        };

        Ok(Self::new(Arc::new(services), gate_for(&config.allowed_users), responder))
    }

    pub fn services(&self) -> &JobServices {
        &self.services
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handle one event. Video jobs run in their own task; the handle is returned
    /// so callers may await the outcome.
    pub async fn handle(self: &Arc<Self>, event: Event) -> Result<Dispatch> {
        log::debug!("Event from user {} in chat {}: {:?}", event.user(), event.chat(), event);

        match event {
            Event::Command { user, chat, name } => self.on_command(user, chat, &name).await,
            Event::Text { user, chat, text } => self.on_text(user, chat, &text).await,
            Event::ButtonTap { user, chat, payload } => self.on_button(user, chat, &payload).await,
            Event::ImageUpload { user, chat, path } => {
                let mut upload = TempFiles::new();
                upload.track(&path);

                match self.services.watermarks.save(user, &path).await {
                    Ok(_) => self.responder.send_text(chat, MSG_IMAGE_SAVED).await?,
                    Err(BotError::InvalidInput(msg)) => self.responder.send_text(chat, &msg).await?,
                    Err(e) => return Err(e),
                }
                Ok(Dispatch::Handled)
            }
            Event::VideoUpload { user, chat, path } => {
                if !self.membership.is_member(user).await {
                    log::info!("User {} is not a member, dropping upload", user);
                    let mut upload = TempFiles::new();
                    upload.track(&path);
                    self.responder.send_text(chat, MSG_SUBSCRIBE).await?;
                    return Ok(Dispatch::Handled);
                }

                // From here the job owns the upload and removes it
                let request = JobRequest::new(user, chat, path);
                if let Err(e) = self.responder.send_text(chat, MSG_PROCESSING).await {
                    log::warn!("Could not send processing notice for job {}: {}", request.job_id, e);
                }

                let bot = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    run_watermark_job(&bot.services, bot.responder.as_ref(), request).await
                });
                Ok(Dispatch::JobStarted(handle))
            }
        }
    }

    async fn on_command(&self, user: UserId, chat: ChatId, name: &str) -> Result<Dispatch> {
        match name {
            "start" => {
                self.services.store.reset_user(user)?;
                self.conversation.sessions().clear(user);
                log::info!("User {} started a session", user);
                self.show(chat, menu::welcome_menu()).await?;
            }
            "settings" => {
                let text = self.services.store.get_text_settings(user)?;
                self.show(chat, menu::text_settings_menu(&text)).await?;
            }
            _ => return Ok(Dispatch::Ignored),
        }
        Ok(Dispatch::Handled)
    }

    async fn on_text(&self, user: UserId, chat: ChatId, text: &str) -> Result<Dispatch> {
        let store = self.services.store.as_ref();
        let Some(outcome) = self.conversation.handle_text(store, user, text)? else {
            return Ok(Dispatch::Ignored);
        };

        self.responder.send_text(chat, &outcome.message()).await?;
        if !matches!(outcome, InputOutcome::Rejected(_)) {
            self.responder.send_text(chat, MSG_SETTINGS_HINT).await?;
        }
        Ok(Dispatch::Handled)
    }

    async fn on_button(&self, user: UserId, chat: ChatId, payload: &str) -> Result<Dispatch> {
        let Some(action) = MenuAction::parse(payload) else {
            log::warn!("Unknown button payload from user {}: {}", user, payload);
            return Ok(Dispatch::Ignored);
        };
        let store = self.services.store.as_ref();

        match action {
            MenuAction::AddWatermark | MenuAction::Back => self.show_main(user, chat).await?,
            MenuAction::Settings => self.show_text_settings(user, chat).await?,
            MenuAction::SetColor => self.show(chat, menu::color_menu()).await?,
            MenuAction::SetSize => self.show(chat, menu::size_menu()).await?,
            MenuAction::SetText => self.await_input(user, PendingInput::Text).await?,
            MenuAction::ColorCustom => self.await_input(user, PendingInput::Color).await?,
            MenuAction::SizeCustom => self.await_input(user, PendingInput::Size).await?,
            MenuAction::ColorPreset(preset) => {
                let color = preset.color_value();
                store.update_text_settings(user, &|s| s.color = color.to_string())?;
                self.responder.answer_callback(user, &format!("Color set to {}", color), false).await?;
                self.show_text_settings(user, chat).await?;
            }
            MenuAction::SizePreset(size) => {
                store.update_text_settings(user, &|s| s.font_size = size)?;
                self.responder.answer_callback(user, &format!("Size set to {}px", size), false).await?;
                self.show_text_settings(user, chat).await?;
            }
            MenuAction::ToggleText => {
                let updated = store.update_text_settings(user, &|s| s.enabled = !s.enabled)?;
                let status = if updated.enabled { "Enabled" } else { "Disabled" };
                self.responder.answer_callback(user, &format!("Text overlay {}", status), false).await?;
                self.show_text_settings(user, chat).await?;
            }
            MenuAction::SetPosition => {
                let placement = store.get_placement(user)?;
                self.show(chat, menu::position_menu(placement.anchor)).await?;
            }
            MenuAction::Position(anchor) => {
                store.update_placement(user, &|p| p.anchor = anchor)?;
                self.responder
                    .answer_callback(user, &format!("Position set to {}", anchor.label()), false)
                    .await?;
                self.show_main(user, chat).await?;
            }
            MenuAction::SetScale => {
                let placement = store.get_placement(user)?;
                self.show(chat, menu::scale_menu(placement.scale_percent)).await?;
            }
            MenuAction::Scale(percent) => {
                store.update_placement(user, &|p| p.scale_percent = percent)?;
                self.responder
                    .answer_callback(user, &format!("Image size set to {}%", percent), false)
                    .await?;
                self.show_main(user, chat).await?;
            }
            MenuAction::RemoveImage => {
                let removed = self.services.watermarks.clear(user).await?;
                let notice = if removed { "Image watermark removed" } else { "No image watermark set" };
                self.responder.answer_callback(user, notice, false).await?;
                self.show_main(user, chat).await?;
            }
        }
        Ok(Dispatch::Handled)
    }

    async fn await_input(&self, user: UserId, state: PendingInput) -> Result<()> {
        self.conversation.begin(user, state);
        self.responder.answer_callback(user, state.prompt(), true).await
    }

    async fn show_main(&self, user: UserId, chat: ChatId) -> Result<()> {
        let placement = self.services.store.get_placement(user)?;
        let has_image = self.services.watermarks.get(user).is_some();
        self.show(chat, menu::main_menu(&placement, has_image)).await
    }

    async fn show_text_settings(&self, user: UserId, chat: ChatId) -> Result<()> {
        let text = self.services.store.get_text_settings(user)?;
        self.show(chat, menu::text_settings_menu(&text)).await
    }

    async fn show(&self, chat: ChatId, menu: Menu) -> Result<()> {
        self.responder.send_menu(chat, &menu.text, &menu.keyboard).await
    }
}
