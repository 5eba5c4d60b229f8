// FFmpeg command builder
// Turns a validated FilterPlan into the argument list for one encode.

use std::path::{Path, PathBuf};

use crate::constants::{AUDIO_CODEC, VIDEO_CODEC};
use crate::error::{BotError, Result};
use super::filter_plan::FilterPlan;

/// Inputs, plan and output for a single ffmpeg run.
#[derive(Debug, Clone)]
pub struct EncodeCommand {
    pub video: PathBuf,
    pub watermark_image: Option<PathBuf>,
    pub plan: FilterPlan,
    pub preset: String,
    pub output: PathBuf,
}

impl EncodeCommand {
    pub fn new(
        video: &Path,
        watermark_image: Option<&Path>,
        plan: FilterPlan,
        preset: &str,
        output: &Path,
    ) -> Result<Self> {
        let expected_inputs = if watermark_image.is_some() { 2 } else { 1 };
        if plan.input_count != expected_inputs {
            return Err(BotError::FilterPlan(format!(
                "plan expects {} inputs but command has {}",
                plan.input_count, expected_inputs
            )));
        }
        plan.validate()?;

        Ok(Self {
            video: video.to_path_buf(),
            watermark_image: watermark_image.map(Path::to_path_buf),
            plan,
            preset: preset.to_string(),
            output: output.to_path_buf(),
        })
    }

    /// Full argument list (without the ffmpeg binary itself).
    pub fn to_args(&self) -> Result<Vec<String>> {
        let mut args: Vec<String> = vec!["-y".into(), "-i".into(), path_str(&self.video)?];

        if let Some(ref image) = self.watermark_image {
            args.extend_from_slice(&["-i".into(), path_str(image)?]);
        }

        if let Some(graph) = self.plan.to_filter_complex() {
            args.extend_from_slice(&["-filter_complex".into(), graph]);
        }

        // "0:a?" keeps videos without an audio track from failing the map
        args.extend_from_slice(&[
            "-map".into(), self.plan.sink.map_arg(),
            "-map".into(), "0:a?".into(),
        ]);

        args.extend(output_encoding_args(&self.preset));
        args.push(path_str(&self.output)?);

        Ok(args)
    }

    /// Single-line rendering for logs.
    pub fn display(&self) -> String {
        match self.to_args() {
            Ok(args) => args.join(" "),
            Err(e) => format!("<unprintable command: {}>", e),
        }
    }
}

/// Re-encode video with the configured preset; pass audio through.
fn output_encoding_args(preset: &str) -> Vec<String> {
    vec![
        "-c:v".into(), VIDEO_CODEC.into(),
        "-preset".into(), preset.into(),
        "-c:a".into(), AUDIO_CODEC.into(),
    ]
}

/// Convert a Path to a String, failing on non-UTF8
fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| BotError::InvalidPath(format!("Path contains non-UTF8 characters: {}", path.display())))
}
