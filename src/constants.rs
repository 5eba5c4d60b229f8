// Watermark Bot Constants
// Defaults shared by the store, the filter builder and the bot menus.

// Placement defaults (written on /start)
pub const DEFAULT_POSITION_KEY: &str = "mc";
pub const DEFAULT_SCALE_PERCENT: u32 = 50;

// Text overlay defaults
pub const DEFAULT_TEXT_COLOR: &str = "white";
pub const DEFAULT_FONT_SIZE: u32 = 24;

// Probe fallbacks when metadata is missing or unreadable
pub const DEFAULT_VIDEO_WIDTH: u32 = 1280;
pub const DEFAULT_VIDEO_HEIGHT: u32 = 720;

// Used when an anchor expression pair has no y component
pub const FALLBACK_Y_EXPR: &str = "10";

// Encoding
pub const DEFAULT_PRESET: &str = "veryfast";
pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "copy";

// Default drawtext font
pub const DEFAULT_FONT_FILE: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

// Paths
pub const APP_DIR_NAME: &str = "watermark-bot";
pub const DB_FILENAME: &str = "settings.db";
pub const WATERMARKS_FOLDER: &str = "watermarks";
pub const WORK_FOLDER: &str = "work";
pub const OUTPUT_PREFIX: &str = "watermarked_";
pub const OUTPUT_EXTENSION: &str = "mp4";

// Menu presets
pub const PRESET_FONT_SIZES: [u32; 3] = [20, 30, 40];
pub const PRESET_SCALES: [u32; 5] = [10, 25, 50, 75, 100];

// Accepted video upload extensions (documents without a video mime type)
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mkv", "mov", "webm"];

// Accepted watermark image extensions; the first is used when the upload has none
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
