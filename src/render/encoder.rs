// Encoder invocation
// Runs ffmpeg as a child process and reports the exit status with captured stderr.
// A non-zero exit is an outcome, not an error; errors are reserved for failing to
// start or wait on the process.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{BotError, Result};
use super::ffmpeg_builder::EncodeCommand;

/// Result of one encoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Captured stderr, for logs only
    pub diagnostics: String,
}

#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, command: &EncodeCommand) -> Result<EncodeOutcome>;
}

/// Encoder backed by the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, command: &EncodeCommand) -> Result<EncodeOutcome> {
        let args = command.to_args()?;
        log::info!("Running ffmpeg: {} {}", self.ffmpeg.display(), args.join(" "));

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BotError::FFmpeg(format!("Failed to start FFmpeg: {}", e)))?;

        Ok(EncodeOutcome {
            success: output.status.success(),
            exit_code: output.status.code(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::filter_plan::FilterPlan;
    use std::path::Path;

    fn passthrough_command() -> EncodeCommand {
        EncodeCommand::new(
            Path::new("in.mp4"),
            None,
            FilterPlan::passthrough(1),
            "veryfast",
            Path::new("out.mp4"),
        ).unwrap()
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-wmbot");
        let result = encoder.encode(&passthrough_command()).await;
        assert!(matches!(result, Err(BotError::FFmpeg(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_outcome() {
        // `false` ignores its arguments and exits 1
        let encoder = FfmpegEncoder::new("false");
        let outcome = encoder.encode(&passthrough_command()).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
    }
}
