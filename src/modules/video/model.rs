use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of the `videos` table.
///
/// Title, description and owner are written by the upload flow; the worker
/// only touches `processed`, `hls_path`, `thumbnail_path` and `duration`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct VideoJob {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub raw_key: String,
    pub processed: bool,
    pub hls_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub duration: Option<String>, // formatted, e.g. "1:05"
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl VideoJob {
    /// Users may upload their own preview before processing finishes.
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_path
            .as_deref()
            .is_some_and(|path| !path.trim().is_empty())
    }
}

/// Fields written once the whole pipeline succeeded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProcessedVideo {
    pub hls_path: String,
    pub duration: String,
    /// `None` keeps whatever thumbnail the job already has.
    pub thumbnail_path: Option<String>,
}
