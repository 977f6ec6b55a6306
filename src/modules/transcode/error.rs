use thiserror::Error;
use uuid::Uuid;

/// Everything that can stop a transcoding run.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Message body is not a valid event envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Object key does not match <owner>/videos/<video>/raw: {key}")]
    MalformedKey { key: String },

    #[error("Video not found: {0}")]
    JobNotFound(Uuid),

    #[error("Video is already processed: {0}")]
    AlreadyProcessed(Uuid),

    #[error("Failed to download {key}: {reason}")]
    DownloadFailure { key: String, reason: String },

    #[error("Failed to probe source video: {0}")]
    ProbeFailure(String),

    #[error("Transcoding failed for {}", failed.join(", "))]
    EncodeFailure { failed: Vec<String> },

    #[error("Failed to upload {key}: {reason}")]
    UploadFailure { key: String, reason: String },

    #[error("Failed to generate thumbnail: {0}")]
    ThumbnailFailure(String),

    #[error("Job store error: {0}")]
    PersistenceFailure(String),

    #[error("Scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("Transcoding cancelled")]
    Cancelled,
}

impl TranscodeError {
    /// Job store outages end the process with a failure status; everything
    /// else leaves the job unprocessed for redelivery.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }

    /// Skips are expected under at-least-once delivery and not worth an alarm.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::AlreadyProcessed(_) | Self::JobNotFound(_) | Self::MalformedKey { .. }
        )
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        Self::PersistenceFailure(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_persistence_is_fatal() {
        assert!(TranscodeError::persistence(anyhow::anyhow!("down")).is_fatal());
        assert!(!TranscodeError::Cancelled.is_fatal());
        assert!(!TranscodeError::EncodeFailure { failed: vec![] }.is_fatal());
        assert!(!TranscodeError::AlreadyProcessed(Uuid::nil()).is_fatal());
    }

    #[test]
    fn test_encode_failure_lists_renditions() {
        let err = TranscodeError::EncodeFailure {
            failed: vec!["720p".to_string(), "1080p".to_string()],
        };
        assert_eq!(err.to_string(), "Transcoding failed for 720p, 1080p");
    }
}
