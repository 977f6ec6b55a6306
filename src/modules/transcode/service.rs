use super::catalog::{RenditionSpec, TranscodeSettings};
use super::duration::format_duration;
use super::encoder::encode_renditions;
use super::error::TranscodeError;
use super::ladder::select_ladder;
use super::manifest::{MASTER_MANIFEST_NAME, master_manifest};
use super::ports::{JobStore, MediaProbe, ObjectStore, RenditionEncoder, ThumbnailExtractor};
use super::publisher::upload_dir;
use super::scratch::ScratchSpace;
use super::thumbnail;
use crate::modules::video::events::{VideoKey, decode_event};
use crate::modules::video::model::{ProcessedVideo, VideoJob};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// External services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn ObjectStore>,
    pub jobs: Arc<dyn JobStore>,
    pub probe: Arc<dyn MediaProbe>,
    pub encoder: Arc<dyn RenditionEncoder>,
    pub thumbnails: Arc<dyn ThumbnailExtractor>,
}

/// What a successful run published.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedJob {
    pub video_id: Uuid,
    pub renditions: Vec<RenditionSpec>,
    pub master_key: String,
    pub duration: String,
    /// Set only when the worker generated the thumbnail.
    pub thumbnail_key: Option<String>,
    pub uploaded: Vec<String>,
}

#[derive(Clone)]
pub struct Transcoder {
    settings: TranscodeSettings,
    scratch: ScratchSpace,
    deps: Collaborators,
}

impl Transcoder {
    pub fn new(settings: TranscodeSettings, scratch: ScratchSpace, deps: Collaborators) -> Self {
        Self {
            settings,
            scratch,
            deps,
        }
    }

    /// Runs the whole pipeline for one queue message.
    ///
    /// `Ok(None)` means the message carried no upload to work on. Errors
    /// leave the job record untouched so a redelivery can start over.
    pub async fn handle_message(
        &self,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CompletedJob>, TranscodeError> {
        let Some(key) = decode_event(body)? else {
            return Ok(None);
        };

        self.handle_key(&key, cancel).await.map(Some)
    }

    /// Runs the pipeline for an upload whose key is already decoded.
    pub async fn handle_key(
        &self,
        key: &VideoKey,
        cancel: &CancellationToken,
    ) -> Result<CompletedJob, TranscodeError> {
        info!("📦 Received upload {} (owner {})", key.video_id, key.owner_id);

        let job = self.guard(key.video_id).await?;
        self.run_job(key, &job, cancel).await
    }

    /// Loads the job and refuses unknown or already processed videos, which
    /// is what makes redelivered messages harmless.
    pub async fn guard(&self, video_id: Uuid) -> Result<VideoJob, TranscodeError> {
        info!("Getting video details: {}", video_id);

        let job = self
            .deps
            .jobs
            .find(video_id)
            .await
            .map_err(TranscodeError::persistence)?
            .ok_or(TranscodeError::JobNotFound(video_id))?;

        if job.processed {
            return Err(TranscodeError::AlreadyProcessed(video_id));
        }

        Ok(job)
    }

    /// Processes a guarded job. The raw download is removed afterwards
    /// whatever the outcome, including cancellation.
    pub async fn run_job(
        &self,
        key: &VideoKey,
        job: &VideoJob,
        cancel: &CancellationToken,
    ) -> Result<CompletedJob, TranscodeError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranscodeError::Cancelled),
            result = self.process(key, job) => result,
        };

        if let Err(e) = &result {
            warn!("Error transcoding video {}: {}", key.video_id, e);
        }
        self.scratch.discard_raw_file(key.video_id).await;

        result
    }

    async fn process(&self, key: &VideoKey, job: &VideoJob) -> Result<CompletedJob, TranscodeError> {
        let deps = &self.deps;

        let raw_path = self.scratch.prepare_raw_file(key.video_id).await?;
        info!("⬇️ Downloading video from storage: {}", key.video_id);
        deps.storage
            .download(&key.raw_key, &raw_path)
            .await
            .map_err(|e| TranscodeError::DownloadFailure {
                key: key.raw_key.clone(),
                reason: format!("{:#}", e),
            })?;

        let source = deps
            .probe
            .probe(&raw_path)
            .await
            .map_err(|e| TranscodeError::ProbeFailure(format!("{:#}", e)))?;
        info!(
            "Raw video resolution: {}x{}, duration {:.2}s",
            source.width, source.height, source.duration_seconds
        );

        let renditions = select_ladder(&self.settings.catalog, &self.settings.fallback, &source);

        let output_dir = self.scratch.fresh_output_dir(key.video_id).await?;
        encode_renditions(
            deps.encoder.as_ref(),
            &raw_path,
            &output_dir,
            &renditions,
            &self.settings.hls,
        )
        .await
        .into_result()?;

        self.write_master_manifest(&output_dir, &renditions).await?;

        info!("⬆️ Uploading transcoded files to storage...");
        let uploaded = upload_dir(deps.storage.as_ref(), &output_dir, &key.hls_prefix()).await?;
        if let Err(e) = fs::remove_dir(&output_dir).await {
            warn!("Failed to remove {}: {}", output_dir.display(), e);
        }

        let thumbnail_key = if job.has_thumbnail() {
            None
        } else {
            Some(
                thumbnail::generate_and_upload(
                    deps.thumbnails.as_ref(),
                    deps.storage.as_ref(),
                    &self.scratch,
                    &raw_path,
                    key,
                    source.duration_seconds,
                    self.settings.thumbnail_size,
                )
                .await?,
            )
        };

        let update = ProcessedVideo {
            hls_path: key.hls_key(MASTER_MANIFEST_NAME),
            duration: format_duration(source.whole_seconds()),
            thumbnail_path: thumbnail_key.clone(),
        };

        info!("Updating video to processed: {}", key.video_id);
        let updated = deps
            .jobs
            .mark_processed(key.video_id, &update)
            .await
            .map_err(TranscodeError::persistence)?;
        if !updated {
            return Err(TranscodeError::AlreadyProcessed(key.video_id));
        }

        Ok(CompletedJob {
            video_id: key.video_id,
            renditions,
            master_key: update.hls_path,
            duration: update.duration,
            thumbnail_key,
            uploaded,
        })
    }

    async fn write_master_manifest(
        &self,
        output_dir: &Path,
        renditions: &[RenditionSpec],
    ) -> Result<(), TranscodeError> {
        let content = master_manifest(renditions, &self.settings.bandwidth);
        fs::write(output_dir.join(MASTER_MANIFEST_NAME), content).await?;
        info!("Master manifest created.");
        Ok(())
    }
}
