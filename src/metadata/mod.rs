// Metadata probing
// Only frame dimensions matter here. A failed or empty probe is never fatal:
// the job falls back to DEFAULT_VIDEO_WIDTH x DEFAULT_VIDEO_HEIGHT.

pub mod ffprobe;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_VIDEO_HEIGHT, DEFAULT_VIDEO_WIDTH, VIDEO_EXTENSIONS};
use crate::error::Result;

/// Raw probe result. Either field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Usable frame size, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIDEO_WIDTH,
            height: DEFAULT_VIDEO_HEIGHT,
        }
    }
}

impl ProbedDimensions {
    /// Fill in missing or zero fields from the defaults.
    pub fn or_default(self) -> VideoDimensions {
        let defaults = VideoDimensions::default();
        VideoDimensions {
            width: self.width.filter(|w| *w > 0).unwrap_or(defaults.width),
            height: self.height.filter(|h| *h > 0).unwrap_or(defaults.height),
        }
    }
}

#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbedDimensions>;
}

/// Probe a file and always come back with usable dimensions.
pub async fn resolve_dimensions(probe: &dyn MetadataProbe, path: &Path) -> VideoDimensions {
    match probe.probe(path).await {
        Ok(dims) => {
            if dims.width.is_none() || dims.height.is_none() {
                log::debug!("Incomplete metadata for {}, using defaults for missing fields", path.display());
            }
            dims.or_default()
        }
        Err(e) => {
            log::debug!("Could not read width/height from {}: {}", path.display(), e);
            VideoDimensions::default()
        }
    }
}

/// True if the path has one of the accepted video container extensions
pub fn is_video_path(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    VIDEO_EXTENSIONS.contains(&ext.as_str())
}
