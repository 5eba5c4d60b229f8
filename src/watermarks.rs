// Per-user watermark images
// Stored as <watermarks_dir>/<user_id>.<ext>. The extension is kept because
// ffmpeg picks the image decoder from it.

use std::path::{Path, PathBuf};

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::{BotError, Result};
use crate::settings::UserId;

#[derive(Debug, Clone)]
pub struct WatermarkLibrary {
    dir: PathBuf,
}

impl WatermarkLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, user: UserId) -> impl Iterator<Item = PathBuf> + '_ {
        IMAGE_EXTENSIONS
            .iter()
            .map(move |ext| self.dir.join(format!("{}.{}", user, ext)))
    }

    /// The user's watermark image, if one was uploaded.
    pub fn get(&self, user: UserId) -> Option<PathBuf> {
        self.candidates(user).find(|p| p.is_file())
    }

    /// Copy an uploaded image in as the user's watermark, replacing any previous one.
    pub async fn save(&self, user: UserId, source: &Path) -> Result<PathBuf> {
        let ext = image_extension(source)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        self.clear(user).await?;

        let dest = self.dir.join(format!("{}.{}", user, ext));
        tokio::fs::copy(source, &dest).await?;
        log::info!("Saved watermark for user {} at {}", user, dest.display());
        Ok(dest)
    }

    /// Remove the user's watermark. Returns true if something was deleted.
    pub async fn clear(&self, user: UserId) -> Result<bool> {
        let mut removed = false;
        for path in self.candidates(user) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

/// Lowercased image extension; uploads without one are treated as the first accepted type.
fn image_extension(path: &Path) -> Result<&'static str> {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_lowercase(),
        None => return Ok(IMAGE_EXTENSIONS[0]),
    };

    IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == ext)
        .ok_or_else(|| BotError::InvalidInput(format!("Unsupported watermark image type: .{}", ext)))
}
