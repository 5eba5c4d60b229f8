// Render module
// Position table, typed filter plan, ffmpeg argument builder and the encoder.

pub mod positions;
pub mod filter_plan;
pub mod ffmpeg_builder;
pub mod encoder;

pub use encoder::{EncodeOutcome, Encoder, FfmpegEncoder};
pub use ffmpeg_builder::EncodeCommand;
pub use filter_plan::{build_plan, FilterPlan, PlanInputs};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metadata::{resolve_dimensions, MetadataProbe};
use crate::settings::{Placement, TextSettings};

/// Settings for one render, however they were obtained.
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    pub placement: Placement,
    pub text: TextSettings,
    pub watermark_image: Option<PathBuf>,
}

/// Probe the input, build and validate the plan, and assemble the ffmpeg command.
pub async fn prepare_encode(
    probe: &dyn MetadataProbe,
    input: &Path,
    output: &Path,
    settings: &RenderSettings,
    font_file: &Path,
    preset: &str,
) -> Result<EncodeCommand> {
    let dimensions = resolve_dimensions(probe, input).await;
    log::debug!("Rendering {} at {}x{}", input.display(), dimensions.width, dimensions.height);

    let image = settings.watermark_image.as_deref();
    let plan = build_plan(&PlanInputs {
        dimensions,
        placement: &settings.placement,
        text: &settings.text,
        watermark_image: image,
        font_file,
    })?;

    EncodeCommand::new(input, image, plan, preset, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ProbedDimensions;
    use async_trait::async_trait;

    struct NoMetadata;

    #[async_trait]
    impl MetadataProbe for NoMetadata {
        async fn probe(&self, _path: &Path) -> Result<ProbedDimensions> {
            Ok(ProbedDimensions::default())
        }
    }

    #[tokio::test]
    async fn test_prepare_encode_uses_default_dimensions() {
        let settings = RenderSettings {
            watermark_image: Some(PathBuf::from("wm.png")),
            ..Default::default()
        };
        let cmd = prepare_encode(
            &NoMetadata,
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            &settings,
            Path::new("/f.ttf"),
            "veryfast",
        ).await.unwrap();

        let graph = cmd.plan.to_filter_complex().unwrap();
        assert!(graph.starts_with("[1:v]scale=640:360[wm]"), "{}", graph);
    }
}
