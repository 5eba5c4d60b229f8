// Bot configuration
// Values come from defaults, then WMBOT_* environment variables, then CLI flags
// (the binary applies the last layer).

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{APP_DIR_NAME, DB_FILENAME, DEFAULT_PRESET, WATERMARKS_FOLDER, WORK_FOLDER};
use crate::error::{BotError, Result};
use crate::tools;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub font_path: PathBuf,
    /// x264 speed/quality preset
    pub preset: String,
    pub data_dir: PathBuf,
    /// Users allowed past the subscription gate. Empty means everyone.
    pub allowed_users: HashSet<i64>,
}

impl BotConfig {
    /// Build a config from the environment, resolving tools the same way
    /// the rest of the crate does.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var("WMBOT_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        let preset = env::var("WMBOT_PRESET")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRESET.to_string());

        let allowed_users = env::var("WMBOT_ALLOWED_USERS")
            .map(|v| parse_user_list(&v))
            .unwrap_or_default();

        Ok(Self {
            ffmpeg_path: tools::ffmpeg_path(),
            ffprobe_path: tools::ffprobe_path(),
            font_path: tools::font_path(),
            preset,
            data_dir,
            allowed_users,
        })
    }

    /// Config rooted at an explicit data directory, tools from PATH. Used by tests.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            font_path: tools::font_path(),
            preset: DEFAULT_PRESET.to_string(),
            data_dir: data_dir.into(),
            allowed_users: HashSet::new(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    pub fn watermarks_dir(&self) -> PathBuf {
        self.data_dir.join(WATERMARKS_FOLDER)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join(WORK_FOLDER)
    }

    /// Create the data, watermark and work folders.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.watermarks_dir())?;
        std::fs::create_dir_all(self.work_dir())?;
        Ok(())
    }
}

/// Platform data directory, e.g. ~/.local/share/watermark-bot
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_DIR_NAME)
        .ok_or_else(|| BotError::Other("Could not determine data directory".to_string()))?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Parse a comma separated list of user ids, skipping junk entries.
fn parse_user_list(value: &str) -> HashSet<i64> {
    value
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    if !s.is_empty() {
                        log::warn!("Ignoring invalid user id in WMBOT_ALLOWED_USERS: {}", s);
                    }
                    None
                }
            }
        })
        .collect()
}
