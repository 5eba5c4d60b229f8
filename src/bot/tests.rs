// Dispatcher scenario tests

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use super::auth::{AllowAll, AllowList, MembershipCheck};
use super::events::{ChatId, Event};
use super::menu::Keyboard;
use super::responder::Responder;
use super::*;
use crate::db::schema::SqliteSettingsStore;
use crate::error::{BotError, Result};
use crate::jobs::{JobOutcome, JobServices, MSG_ENCODER_FAILED, MSG_UNEXPECTED, MSG_UPLOADING};
use crate::metadata::{MetadataProbe, ProbedDimensions};
use crate::render::{EncodeCommand, EncodeOutcome, Encoder};
use crate::settings::{Anchor, Placement, SettingsStore, TextSettings, UserId};
use crate::watermarks::WatermarkLibrary;

const USER: UserId = 7;
const CHAT: ChatId = 70;

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text(String),
    Menu(String, Keyboard),
    /// Path and whether the file existed at upload time
    Video(PathBuf, bool),
    Callback(String, bool),
}

#[derive(Default)]
struct RecordingResponder {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingResponder {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send_text(&self, _chat: ChatId, text: &str) -> Result<()> {
        self.push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_menu(&self, _chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.push(Sent::Menu(text.to_string(), keyboard.clone()));
        Ok(())
    }

    async fn send_video(&self, _chat: ChatId, path: &Path) -> Result<()> {
        self.push(Sent::Video(path.to_path_buf(), path.exists()));
        Ok(())
    }

    async fn answer_callback(&self, _user: UserId, text: &str, alert: bool) -> Result<()> {
        self.push(Sent::Callback(text.to_string(), alert));
        Ok(())
    }
}

struct FixedProbe;

#[async_trait]
impl MetadataProbe for FixedProbe {
    async fn probe(&self, _path: &Path) -> Result<ProbedDimensions> {
        Ok(ProbedDimensions { width: Some(1920), height: Some(1080) })
    }
}

#[derive(Clone, Copy)]
enum EncoderMode {
    Succeed,
    ExitNonZero,
    Crash,
}

struct FakeEncoder {
    mode: EncoderMode,
    commands: Mutex<Vec<EncodeCommand>>,
}

impl FakeEncoder {
    fn new(mode: EncoderMode) -> Self {
        Self { mode, commands: Mutex::new(Vec::new()) }
    }

    fn commands(&self) -> Vec<EncodeCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(&self, command: &EncodeCommand) -> Result<EncodeOutcome> {
        self.commands.lock().unwrap().push(command.clone());
        // Every mode leaves something at the output path, like a real encoder that
        // dies partway through
        std::fs::write(&command.output, b"encoded")?;
        match self.mode {
            EncoderMode::Succeed => {
                Ok(EncodeOutcome { success: true, exit_code: Some(0), diagnostics: String::new() })
            }
            EncoderMode::ExitNonZero => Ok(EncodeOutcome {
                success: false,
                exit_code: Some(1),
                diagnostics: "Invalid filtergraph".to_string(),
            }),
            EncoderMode::Crash => Err(BotError::FFmpeg("process vanished".to_string())),
        }
    }
}

struct Fixture {
    bot: Arc<Bot>,
    responder: Arc<RecordingResponder>,
    encoder: Arc<FakeEncoder>,
    store: Arc<SqliteSettingsStore>,
    tmp: TempDir,
}

impl Fixture {
    fn new(mode: EncoderMode, membership: Box<dyn MembershipCheck>) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteSettingsStore::open_in_memory().unwrap());
        let encoder = Arc::new(FakeEncoder::new(mode));
        let responder = Arc::new(RecordingResponder::default());

        let services = JobServices {
            store: store.clone(),
            probe: Arc::new(FixedProbe),
            encoder: encoder.clone(),
            watermarks: WatermarkLibrary::new(tmp.path().join("watermarks")),
            font_path: PathBuf::from("/fonts/DejaVuSans.ttf"),
            preset: "veryfast".to_string(),
            work_dir: tmp.path().join("work"),
        };
        let bot = Arc::new(Bot::new(Arc::new(services), membership, responder.clone()));

        Self { bot, responder, encoder, store, tmp }
    }

    fn upload(&self, name: &str) -> PathBuf {
        let path = self.tmp.path().join(name);
        std::fs::write(&path, b"upload").unwrap();
        path
    }

    async fn send(&self, event: Event) -> Dispatch {
        self.bot.handle(event).await.unwrap()
    }

    async fn tap(&self, payload: &str) -> Dispatch {
        self.send(Event::ButtonTap { user: USER, chat: CHAT, payload: payload.to_string() }).await
    }

    async fn say(&self, text: &str) -> Dispatch {
        self.send(Event::Text { user: USER, chat: CHAT, text: text.to_string() }).await
    }

    async fn run_video(&self, path: PathBuf) -> JobOutcome {
        match self.send(Event::VideoUpload { user: USER, chat: CHAT, path }).await {
            Dispatch::JobStarted(handle) => handle.await.unwrap(),
            other => panic!("expected a job, got {:?}", other),
        }
    }
}

fn fixture() -> Fixture {
    Fixture::new(EncoderMode::Succeed, Box::new(AllowAll))
}

#[tokio::test]
async fn test_start_resets_settings_and_shows_welcome() {
    let fx = fixture();
    fx.store.set_placement(USER, &Placement { anchor: Anchor::TopLeft, scale_percent: 10 }).unwrap();
    fx.bot.conversation().begin(USER, crate::conversation::PendingInput::Color);

    let result = fx.send(Event::Command { user: USER, chat: CHAT, name: "start".to_string() }).await;
    assert!(matches!(result, Dispatch::Handled));
    assert_eq!(fx.store.get_placement(USER).unwrap(), Placement::default());
    assert_eq!(fx.bot.conversation().sessions().get(USER), None);

    let sent = fx.responder.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Sent::Menu(_, keyboard) => assert!(keyboard.find("add_wm").is_some()),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_settings_command_shows_text_menu() {
    let fx = fixture();
    fx.send(Event::Command { user: USER, chat: CHAT, name: "settings".to_string() }).await;

    match fx.responder.take().as_slice() {
        [Sent::Menu(title, keyboard)] => {
            assert_eq!(title, "**Text Watermark Settings:**");
            assert!(keyboard.find("toggle_text").is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_command_and_idle_text_are_ignored() {
    let fx = fixture();
    let r = fx.send(Event::Command { user: USER, chat: CHAT, name: "help".to_string() }).await;
    assert!(matches!(r, Dispatch::Ignored));
    assert!(matches!(fx.say("hello").await, Dispatch::Ignored));
    assert!(fx.responder.take().is_empty());
    assert_eq!(fx.store.get_text_settings(USER).unwrap(), TextSettings::default());
}

#[tokio::test]
async fn test_set_text_flow() {
    let fx = fixture();
    fx.tap("set_text").await;
    assert_eq!(
        fx.responder.take(),
        vec![Sent::Callback("Send your watermark text:".to_string(), true)]
    );

    fx.say("it's mine").await;
    assert_eq!(
        fx.responder.take(),
        vec![Sent::Text("Text set!".to_string()), Sent::Text("/settings to view.".to_string())]
    );
    assert_eq!(fx.store.get_text_settings(USER).unwrap().text, "it's mine");

    // Back to idle
    assert!(matches!(fx.say("again").await, Dispatch::Ignored));
}

#[tokio::test]
async fn test_custom_color_retry_then_accept() {
    let fx = fixture();
    fx.tap("set_color").await;
    fx.tap("color_custom").await;
    fx.responder.take();

    fx.say("not-a-hex").await;
    assert_eq!(fx.responder.take(), vec![Sent::Text("Invalid hex. Try again.".to_string())]);
    assert_eq!(fx.store.get_text_settings(USER).unwrap().color, "white");

    fx.say("#1A2B3C").await;
    let sent = fx.responder.take();
    assert_eq!(sent[0], Sent::Text("Color set!".to_string()));
    assert_eq!(fx.store.get_text_settings(USER).unwrap().color, "#1A2B3C");
}

#[tokio::test]
async fn test_custom_size_rejects_non_numeric() {
    let fx = fixture();
    fx.tap("size_custom").await;
    fx.say("abc").await;
    fx.say("12").await;

    let sent = fx.responder.take();
    assert!(sent.contains(&Sent::Text("Invalid number. Try again.".to_string())));
    assert!(sent.contains(&Sent::Text("Size set to 12px!".to_string())));
    assert_eq!(fx.store.get_text_settings(USER).unwrap().font_size, 12);
}

#[tokio::test]
async fn test_preset_buttons_update_settings() {
    let fx = fixture();
    fx.tap("color_red").await;
    fx.tap("size_40").await;
    fx.tap("toggle_text").await;

    let text = fx.store.get_text_settings(USER).unwrap();
    assert_eq!(text.color, "#FF0000");
    assert_eq!(text.font_size, 40);
    assert!(text.enabled);

    let sent = fx.responder.take();
    assert!(sent.contains(&Sent::Callback("Color set to #FF0000".to_string(), false)));
    assert!(sent.contains(&Sent::Callback("Size set to 40px".to_string(), false)));
    assert!(sent.contains(&Sent::Callback("Text overlay Enabled".to_string(), false)));
}

#[tokio::test]
async fn test_position_and_scale_buttons() {
    let fx = fixture();
    fx.tap("pos_br").await;
    fx.tap("scale_25").await;

    assert_eq!(
        fx.store.get_placement(USER).unwrap(),
        Placement { anchor: Anchor::BottomRight, scale_percent: 25 }
    );
}

#[tokio::test]
async fn test_unknown_payload_is_ignored() {
    let fx = fixture();
    assert!(matches!(fx.tap("pos_zz").await, Dispatch::Ignored));
    assert!(fx.responder.take().is_empty());
}

#[tokio::test]
async fn test_non_member_upload_is_refused() {
    let fx = Fixture::new(EncoderMode::Succeed, Box::new(AllowList::new([1])));
    let input = fx.upload("video.mp4");

    let result = fx.send(Event::VideoUpload { user: USER, chat: CHAT, path: input.clone() }).await;
    assert!(matches!(result, Dispatch::Handled));
    assert_eq!(fx.responder.take(), vec![Sent::Text("Subscribe first!".to_string())]);
    assert!(fx.encoder.commands().is_empty());
    assert!(!input.exists());
}

#[tokio::test]
async fn test_video_job_delivers_and_cleans_up() {
    let fx = fixture();
    fx.tap("set_text").await;
    fx.say("hello").await;
    fx.tap("toggle_text").await;
    fx.responder.take();

    let input = fx.upload("video.mp4");
    assert_eq!(fx.run_video(input.clone()).await, JobOutcome::Delivered);

    let sent = fx.responder.take();
    assert_eq!(sent[0], Sent::Text("Processing video...".to_string()));
    assert_eq!(sent[1], Sent::Text(MSG_UPLOADING.to_string()));
    let Sent::Video(output, existed) = &sent[2] else { panic!("expected video, got {:?}", sent[2]) };
    assert!(*existed);
    assert!(output.file_name().unwrap().to_str().unwrap().starts_with("watermarked_"));

    let commands = fx.encoder.commands();
    assert_eq!(commands.len(), 1);
    let graph = commands[0].plan.to_filter_complex().unwrap();
    assert!(graph.contains("text='hello'"), "{}", graph);
    assert!(commands[0].watermark_image.is_none());

    assert!(!input.exists());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_uploaded_image_is_used_by_next_job() {
    let fx = fixture();
    let image = fx.upload("logo.png");
    fx.send(Event::ImageUpload { user: USER, chat: CHAT, path: image.clone() }).await;
    assert_eq!(fx.responder.take(), vec![Sent::Text(MSG_IMAGE_SAVED.to_string())]);
    assert!(!image.exists());

    fx.run_video(fx.upload("video.mp4")).await;
    let commands = fx.encoder.commands();
    let used = commands[0].watermark_image.as_ref().unwrap();
    assert!(used.ends_with("watermarks/7.png"));
    // 50% of the probed 1920x1080
    let graph = commands[0].plan.to_filter_complex().unwrap();
    assert!(graph.starts_with("[1:v]scale=960:540[wm]"), "{}", graph);
}

#[tokio::test]
async fn test_unsupported_image_type_is_reported() {
    let fx = fixture();
    let image = fx.upload("logo.gif");
    let result = fx.send(Event::ImageUpload { user: USER, chat: CHAT, path: image }).await;
    assert!(matches!(result, Dispatch::Handled));

    match fx.responder.take().as_slice() {
        [Sent::Text(msg)] => assert!(msg.contains(".gif"), "{}", msg),
        other => panic!("unexpected {:?}", other),
    }
    assert!(fx.bot.services().watermarks.get(USER).is_none());
}

#[tokio::test]
async fn test_remove_image_button() {
    let fx = fixture();
    fx.send(Event::ImageUpload { user: USER, chat: CHAT, path: fx.upload("logo.jpg") }).await;
    fx.responder.take();

    fx.tap("remove_wm").await;
    assert!(fx.bot.services().watermarks.get(USER).is_none());
    assert!(fx.responder.take().contains(&Sent::Callback("Image watermark removed".to_string(), false)));
}

#[tokio::test]
async fn test_encoder_failure_is_reported_generically() {
    let fx = Fixture::new(EncoderMode::ExitNonZero, Box::new(AllowAll));
    let input = fx.upload("video.mp4");

    assert_eq!(fx.run_video(input.clone()).await, JobOutcome::EncoderFailed);
    let sent = fx.responder.take();
    assert_eq!(sent.last().unwrap(), &Sent::Text(MSG_ENCODER_FAILED.to_string()));
    assert!(!sent.iter().any(|s| matches!(s, Sent::Text(t) if t.contains("filtergraph"))));
    assert!(!sent.iter().any(|s| matches!(s, Sent::Video(..))));
    assert!(!input.exists());
    let output = fx.encoder.commands()[0].output.clone();
    assert!(!output.exists(), "partial output left at {}", output.display());
}

#[tokio::test]
async fn test_unexpected_error_still_cleans_up() {
    let fx = Fixture::new(EncoderMode::Crash, Box::new(AllowAll));
    let input = fx.upload("video.mp4");

    assert_eq!(fx.run_video(input.clone()).await, JobOutcome::Unexpected);
    assert_eq!(fx.responder.take().last().unwrap(), &Sent::Text(MSG_UNEXPECTED.to_string()));
    assert!(!input.exists());
    let output = fx.encoder.commands()[0].output.clone();
    assert!(!output.exists(), "partial output left at {}", output.display());
}

#[tokio::test]
async fn test_video_upload_keeps_settings() {
    let fx = fixture();
    fx.tap("pos_tl").await;
    fx.run_video(fx.upload("video.mp4")).await;
    assert_eq!(fx.store.get_placement(USER).unwrap().anchor, Anchor::TopLeft);
}
