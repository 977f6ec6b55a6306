use crate::modules::transcode::error::TranscodeError;
use crate::modules::transcode::service::{CompletedJob, Transcoder};
use crate::modules::video::events::VideoKey;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Handles the one message this process was started for.
///
/// Only job store outages come back as `Err`; every other failure is logged
/// and swallowed so the job stays unprocessed and the message can be redriven.
pub async fn process_message(
    transcoder: &Transcoder,
    body: &str,
    cancel: &CancellationToken,
) -> Result<(), TranscodeError> {
    report_outcome(transcoder.handle_message(body, cancel).await)
}

/// Same as [`process_message`] for a key decoded ahead of time.
pub async fn process_key(
    transcoder: &Transcoder,
    key: &VideoKey,
    cancel: &CancellationToken,
) -> Result<(), TranscodeError> {
    report_outcome(transcoder.handle_key(key, cancel).await.map(Some))
}

/// Logs a run's outcome at the level it deserves and keeps only fatal errors.
pub fn report_outcome(
    outcome: Result<Option<CompletedJob>, TranscodeError>,
) -> Result<(), TranscodeError> {
    match outcome {
        Ok(Some(done)) => {
            info!(
                "✅ Video processed: {} ({} renditions, {} files, duration {})",
                done.video_id,
                done.renditions.len(),
                done.uploaded.len(),
                done.duration
            );
            Ok(())
        }
        Ok(None) => {
            info!("Nothing to process in message");
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!("❌ Job store unavailable: {}", e);
            Err(e)
        }
        Err(e @ TranscodeError::AlreadyProcessed(_)) => {
            info!("Skipping: {}", e);
            Ok(())
        }
        Err(e) if e.is_skip() => {
            warn!("Skipping: {}", e);
            Ok(())
        }
        Err(e) => {
            error!("❌ Failed to process job: {}", e);
            Ok(())
        }
    }
}
