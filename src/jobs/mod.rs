// Watermark job
// One job per uploaded video: probe, load settings, build the plan, encode and
// deliver. Every failure is terminal for the job and the temp files are always
// removed.

pub mod cleanup;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::bot::events::ChatId;
use crate::bot::responder::Responder;
use crate::constants::{OUTPUT_EXTENSION, OUTPUT_PREFIX};
use crate::error::Result;
use crate::metadata::MetadataProbe;
use crate::render::{prepare_encode, Encoder, RenderSettings};
use crate::settings::{SettingsStore, UserId};
use crate::watermarks::WatermarkLibrary;
use cleanup::TempFiles;

pub const MSG_PROCESSING: &str = "Processing video...";
pub const MSG_UPLOADING: &str = "Processing complete, uploading...";
pub const MSG_ENCODER_FAILED: &str = "Error processing video. Check logs for details.";
pub const MSG_UNEXPECTED: &str = "Unexpected error while processing.";

/// Collaborators shared by every job.
pub struct JobServices {
    pub store: Arc<dyn SettingsStore>,
    pub probe: Arc<dyn MetadataProbe>,
    pub encoder: Arc<dyn Encoder>,
    pub watermarks: WatermarkLibrary,
    pub font_path: PathBuf,
    pub preset: String,
    pub work_dir: PathBuf,
}

impl JobServices {
    /// Output location for a job.
    pub fn output_path(&self, job_id: &Uuid) -> PathBuf {
        self.work_dir
            .join(format!("{}{}.{}", OUTPUT_PREFIX, job_id, OUTPUT_EXTENSION))
    }

    /// Current settings for a user, including the watermark image if one exists.
    pub fn render_settings(&self, user: UserId) -> Result<RenderSettings> {
        Ok(RenderSettings {
            placement: self.store.get_placement(user)?,
            text: self.store.get_text_settings(user)?,
            watermark_image: self.watermarks.get(user),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: Uuid,
    pub user: UserId,
    pub chat: ChatId,
    /// Downloaded upload. Owned by the job and deleted when it ends.
    pub input: PathBuf,
}

impl JobRequest {
    pub fn new(user: UserId, chat: ChatId, input: impl Into<PathBuf>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user,
            chat,
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered,
    EncoderFailed,
    Unexpected,
}

/// Run one job to completion. Never fails; the outcome has already been reported
/// to the user when this returns.
pub async fn run_watermark_job(
    services: &JobServices,
    responder: &dyn Responder,
    request: JobRequest,
) -> JobOutcome {
    let output = services.output_path(&request.job_id);

    let mut temp = TempFiles::new();
    temp.track(&request.input);
    temp.track(&output);

    log::info!(
        "Job {} started for user {} ({})",
        request.job_id, request.user, request.input.display()
    );

    let outcome = match execute(services, responder, &request, &output).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Job {} failed unexpectedly: {}", request.job_id, e);
            JobOutcome::Unexpected
        }
    };

    let notice = match outcome {
        JobOutcome::Delivered => None,
        JobOutcome::EncoderFailed => Some(MSG_ENCODER_FAILED),
        JobOutcome::Unexpected => Some(MSG_UNEXPECTED),
    };
    if let Some(text) = notice {
        if let Err(e) = responder.send_text(request.chat, text).await {
            log::warn!("Could not report job {} failure: {}", request.job_id, e);
        }
    }

    log::info!("Job {} finished: {:?}", request.job_id, outcome);
    outcome
}

async fn execute(
    services: &JobServices,
    responder: &dyn Responder,
    request: &JobRequest,
    output: &Path,
) -> Result<JobOutcome> {
    let settings = services.render_settings(request.user)?;
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let command = prepare_encode(
        services.probe.as_ref(),
        &request.input,
        output,
        &settings,
        &services.font_path,
        &services.preset,
    )
    .await?;

    let result = services.encoder.encode(&command).await?;
    if !result.success {
        log::error!(
            "Encoder exited with {:?} for job {}:\n{}",
            result.exit_code, request.job_id, result.diagnostics
        );
        return Ok(JobOutcome::EncoderFailed);
    }

    responder.send_text(request.chat, MSG_UPLOADING).await?;
    responder.send_video(request.chat, output).await?;
    Ok(JobOutcome::Delivered)
}
