// FFprobe wrapper for frame dimensions

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{BotError, Result};
use super::{MetadataProbe, ProbedDimensions};

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

/// Probe backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe: PathBuf,
}

impl FfprobeProbe {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self { ffprobe: ffprobe.into() }
    }
}

#[async_trait]
impl MetadataProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<ProbedDimensions> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_streams",
                "-select_streams", "v:0",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| BotError::FFprobe(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BotError::FFprobe(format!("ffprobe failed: {}", stderr)));
        }

        parse_probe_output(&output.stdout)
    }
}

/// Extract the first video stream's dimensions from ffprobe JSON
fn parse_probe_output(stdout: &[u8]) -> Result<ProbedDimensions> {
    let probe_output: FFprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| BotError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let video = probe_output
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    Ok(match video {
        Some(stream) => ProbedDimensions {
            width: stream.width.and_then(|w| u32::try_from(w).ok()),
            height: stream.height.and_then(|h| u32::try_from(h).ok()),
        },
        None => ProbedDimensions::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_stream() {
        let json = br#"{"streams":[{"codec_type":"audio"},{"codec_type":"video","width":1920,"height":1080}]}"#;
        let dims = parse_probe_output(json).unwrap();
        assert_eq!(dims, ProbedDimensions { width: Some(1920), height: Some(1080) });
    }

    #[test]
    fn test_parse_no_video_stream() {
        let dims = parse_probe_output(br#"{"streams":[]}"#).unwrap();
        assert_eq!(dims, ProbedDimensions::default());

        let dims = parse_probe_output(br#"{}"#).unwrap();
        assert_eq!(dims, ProbedDimensions::default());
    }

    #[test]
    fn test_parse_negative_dimension_dropped() {
        let dims = parse_probe_output(br#"{"streams":[{"codec_type":"video","width":-1,"height":720}]}"#).unwrap();
        assert_eq!(dims, ProbedDimensions { width: None, height: Some(720) });
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let probe = FfprobeProbe::new("/nonexistent/ffprobe-wmbot");
        let result = probe.probe(Path::new("in.mp4")).await;
        assert!(matches!(result, Err(BotError::FFprobe(_))));
    }
}
