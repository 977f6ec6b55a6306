//! Collaborators the transcoder drives.
//!
//! Production implementations live in `infrastructure`; tests swap in fakes.

use super::catalog::{HlsParams, RenditionSpec};
use super::probe::SourceProbe;
use crate::modules::video::model::{ProcessedVideo, VideoJob};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Object storage holding raw uploads and published outputs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams the object at `key` into a local file at `dest`.
    async fn download(&self, key: &str, dest: &Path) -> Result<()>;

    async fn upload(&self, key: &str, src: &Path, content_type: &str) -> Result<()>;
}

/// Persisted video records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<VideoJob>>;

    /// Returns `false` when no unprocessed record matched, i.e. another
    /// delivery of the same upload already finished it.
    async fn mark_processed(&self, id: Uuid, update: &ProcessedVideo) -> Result<bool>;
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<SourceProbe>;
}

#[async_trait]
pub trait RenditionEncoder: Send + Sync {
    /// Encodes one rendition into `output_dir` and returns the path of its
    /// sub-manifest. Segment files land next to it.
    async fn encode(
        &self,
        input: &Path,
        output_dir: &Path,
        spec: &RenditionSpec,
        hls: &HlsParams,
    ) -> Result<PathBuf>;
}

#[async_trait]
pub trait ThumbnailExtractor: Send + Sync {
    /// Writes a single frame taken `at_seconds` into the video to `dest`.
    async fn extract(
        &self,
        input: &Path,
        at_seconds: u64,
        size: (u32, u32),
        dest: &Path,
    ) -> Result<()>;
}
