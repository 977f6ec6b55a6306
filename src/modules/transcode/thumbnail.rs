use super::error::TranscodeError;
use super::ports::{ObjectStore, ThumbnailExtractor};
use super::scratch::{ScratchSpace, remove_file_if_exists};
use crate::modules::video::events::VideoKey;
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

/// Whole second drawn uniformly from `[0, duration)`.
pub fn random_timestamp(duration_seconds: f64) -> u64 {
    let upper = (duration_seconds.floor() as u64).max(1);
    rand::rng().random_range(0..upper)
}

/// Extracts a preview frame and uploads it, returning its storage key.
pub async fn generate_and_upload(
    extractor: &dyn ThumbnailExtractor,
    store: &dyn ObjectStore,
    scratch: &ScratchSpace,
    input: &Path,
    key: &VideoKey,
    duration_seconds: f64,
    size: (u32, u32),
) -> Result<String, TranscodeError> {
    let local = scratch
        .prepare_thumbnail_file(&key.thumbnail_file_name())
        .await?;
    let at = random_timestamp(duration_seconds);

    extractor
        .extract(input, at, size, &local)
        .await
        .map_err(|e| TranscodeError::ThumbnailFailure(format!("{:#}", e)))?;

    let remote = key.thumbnail_key();
    let uploaded = store.upload(&remote, &local, "image/jpeg").await;

    if let Err(e) = remove_file_if_exists(&local).await {
        warn!("Failed to remove thumbnail {}: {}", local.display(), e);
    }

    uploaded.map_err(|e| TranscodeError::UploadFailure {
        key: remote.clone(),
        reason: format!("{:#}", e),
    })?;

    info!("🖼️ Thumbnail uploaded to {}", remote);
    Ok(remote)
}
