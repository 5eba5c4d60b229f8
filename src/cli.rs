// Watermark Bot CLI binary

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use watermark_bot::bot::events::{ChatId, Event};
use watermark_bot::bot::menu::Keyboard;
use watermark_bot::bot::responder::Responder;
use watermark_bot::constants::{DEFAULT_FONT_SIZE, DEFAULT_POSITION_KEY, DEFAULT_SCALE_PERCENT, DEFAULT_TEXT_COLOR};
use watermark_bot::db::schema::SqliteSettingsStore;
use watermark_bot::metadata::{self, ffprobe::FfprobeProbe};
use watermark_bot::render::{prepare_encode, EncodeCommand, Encoder, FfmpegEncoder, RenderSettings};
use watermark_bot::settings::{Anchor, Placement, SettingsStore, TextSettings, UserId};
use watermark_bot::{tools, Bot, BotConfig, BotError, Dispatch};

#[derive(Parser)]
#[command(name = "wmbot")]
#[command(about = "Watermark Bot - burn text and image watermarks into videos", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (settings database, watermark images, work files)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Encoder preset, overrides WMBOT_PRESET
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark a local video
    Render(RenderArgs),

    /// Print the ffmpeg invocation for a render without running it
    Plan(RenderArgs),

    /// Show a user's stored settings as JSON
    Settings {
        #[arg(long)]
        user: UserId,
    },

    /// Drive the bot from stdin as a local chat
    Console {
        #[arg(long, default_value = "1")]
        user: UserId,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Input video
    input: PathBuf,
    /// Output file (defaults to <input>_watermarked.mp4)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Text to draw; omitting it disables the text overlay
    #[arg(long)]
    text: Option<String>,
    #[arg(long, default_value = DEFAULT_TEXT_COLOR)]
    color: String,
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: u32,
    /// Anchor key: tl, tc, tr, ml, mc, mr, bl, bc, br
    #[arg(long, default_value = DEFAULT_POSITION_KEY)]
    position: String,
    /// Image watermark size in percent of the video
    #[arg(long, default_value_t = DEFAULT_SCALE_PERCENT)]
    scale: u32,
    /// Watermark image
    #[arg(long)]
    image: Option<PathBuf>,
}

impl RenderArgs {
    fn settings(&self) -> Result<RenderSettings> {
        if !(1..=100).contains(&self.scale) {
            anyhow::bail!("--scale must be between 1 and 100, got {}", self.scale);
        }
        if self.font_size == 0 {
            anyhow::bail!("--font-size must be positive");
        }
        let anchor = Anchor::parse_key(&self.position).unwrap_or_else(|| {
            log::warn!("Unknown position '{}', using center", self.position);
            Anchor::default()
        });

        Ok(RenderSettings {
            placement: Placement { anchor, scale_percent: self.scale },
            text: TextSettings {
                enabled: self.text.is_some(),
                text: self.text.clone().unwrap_or_default(),
                color: self.color.clone(),
                font_size: self.font_size,
            },
            watermark_image: self.image.clone(),
        })
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self.input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
            self.input.with_file_name(format!("{}_watermarked.mp4", stem))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = BotConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(preset) = cli.preset {
        config.preset = preset;
    }

    match cli.command {
        Commands::Render(args) => cmd_render(&config, args).await,
        Commands::Plan(args) => cmd_plan(&config, args).await,
        Commands::Settings { user } => cmd_settings(&config, user),
        Commands::Console { user } => cmd_console(config, user).await,
    }
}

async fn build_command(config: &BotConfig, args: &RenderArgs) -> Result<EncodeCommand> {
    if !args.input.is_file() {
        anyhow::bail!("Input not found: {}", args.input.display());
    }
    if !metadata::is_video_path(&args.input) {
        log::warn!("{} does not look like a video file", args.input.display());
    }

    let probe = FfprobeProbe::new(&config.ffprobe_path);
    let command = prepare_encode(
        &probe,
        &args.input,
        &args.output_path(),
        &args.settings()?,
        &config.font_path,
        &config.preset,
    )
    .await?;
    Ok(command)
}

async fn cmd_render(config: &BotConfig, args: RenderArgs) -> Result<()> {
    if !tools::is_tool_available("ffmpeg") {
        log::warn!("ffmpeg not found at {}", config.ffmpeg_path.display());
    }

    let command = build_command(config, &args).await?;
    let outcome = FfmpegEncoder::new(&config.ffmpeg_path).encode(&command).await?;

    if !outcome.success {
        eprintln!("{}", outcome.diagnostics);
        anyhow::bail!("ffmpeg exited with {:?}", outcome.exit_code);
    }

    println!("Wrote {}", command.output.display());
    Ok(())
}

async fn cmd_plan(config: &BotConfig, args: RenderArgs) -> Result<()> {
    let command = build_command(config, &args).await?;

    match command.plan.to_filter_complex() {
        Some(graph) => println!("Filter graph: {}", graph),
        None => println!("Filter graph: (passthrough)"),
    }
    println!("{} {}", config.ffmpeg_path.display(), command.display());
    Ok(())
}

fn cmd_settings(config: &BotConfig, user: UserId) -> Result<()> {
    let store = SqliteSettingsStore::open(&config.db_path())?;
    let report = serde_json::json!({
        "user": user,
        "placement": store.get_placement(user)?,
        "text": store.get_text_settings(user)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Prints everything the bot sends. Finished videos are copied to the
/// current directory before the job deletes them.
struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn send_text(&self, _chat: ChatId, text: &str) -> watermark_bot::Result<()> {
        println!("bot> {}", text);
        Ok(())
    }

    async fn send_menu(&self, _chat: ChatId, text: &str, keyboard: &Keyboard) -> watermark_bot::Result<()> {
        println!("bot> {}", text);
        for row in &keyboard.rows {
            let line: Vec<String> = row
                .iter()
                .map(|b| format!("[{}] /tap {}", b.label, b.payload))
                .collect();
            println!("     {}", line.join("   "));
        }
        Ok(())
    }

    async fn send_video(&self, _chat: ChatId, path: &Path) -> watermark_bot::Result<()> {
        let name = path.file_name().unwrap_or(path.as_os_str());
        let dest = std::env::current_dir()?.join(name);
        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| BotError::Transport(format!("Could not deliver {}: {}", path.display(), e)))?;
        println!("bot> [video] {}", dest.display());
        Ok(())
    }

    async fn answer_callback(&self, _user: UserId, text: &str, alert: bool) -> watermark_bot::Result<()> {
        if alert {
            println!("bot> (!) {}", text);
        } else {
            println!("bot> ({})", text);
        }
        Ok(())
    }
}

/// Copy a user file into the work folder; the bot deletes uploads it owns.
async fn stage_upload(config: &BotConfig, source: &str) -> Result<PathBuf> {
    let source = Path::new(source.trim());
    let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("bin");
    let staged = config.work_dir().join(format!("upload_{}.{}", Uuid::new_v4(), ext));
    tokio::fs::copy(source, &staged)
        .await
        .with_context(|| format!("Failed to read {}", source.display()))?;
    Ok(staged)
}

async fn console_event(config: &BotConfig, user: UserId, line: &str) -> Result<Event> {
    let chat: ChatId = user;
    let event = if let Some(path) = line.strip_prefix("/video ") {
        if !metadata::is_video_path(Path::new(path.trim())) {
            log::warn!("{} does not look like a video file", path.trim());
        }
        Event::VideoUpload { user, chat, path: stage_upload(config, path).await? }
    } else if let Some(path) = line.strip_prefix("/image ") {
        Event::ImageUpload { user, chat, path: stage_upload(config, path).await? }
    } else if let Some(payload) = line.strip_prefix("/tap ") {
        Event::ButtonTap { user, chat, payload: payload.trim().to_string() }
    } else {
        Event::from_message(user, chat, line)
    };
    Ok(event)
}

async fn cmd_console(config: BotConfig, user: UserId) -> Result<()> {
    if !tools::is_tool_available("ffmpeg") {
        log::warn!("ffmpeg not found at {}; video jobs will fail", config.ffmpeg_path.display());
    }

    let bot = Arc::new(Bot::from_config(&config, Arc::new(ConsoleResponder))?);
    println!("Console for user {}. Try /start, /settings, /video PATH, /image PATH, /tap PAYLOAD", user);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match console_event(&config, user, line).await {
            Ok(event) => event,
            Err(e) => {
                eprintln!("error: {:#}", e);
                continue;
            }
        };

        match bot.handle(event).await {
            Ok(Dispatch::JobStarted(handle)) => {
                let outcome = handle.await.context("Job task panicked")?;
                log::info!("Job finished: {:?}", outcome);
            }
            Ok(Dispatch::Ignored) => println!("(ignored)"),
            Ok(Dispatch::Handled) => {}
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}
