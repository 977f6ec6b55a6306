//! In-memory collaborators for driving the transcoder end to end.

#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use hls_worker::modules::transcode::catalog::{HlsParams, RenditionSpec, TranscodeSettings};
use hls_worker::modules::transcode::ports::{
    JobStore, MediaProbe, ObjectStore, RenditionEncoder, ThumbnailExtractor,
};
use hls_worker::modules::transcode::probe::SourceProbe;
use hls_worker::modules::transcode::scratch::ScratchSpace;
use hls_worker::modules::transcode::service::{Collaborators, Transcoder};
use hls_worker::modules::video::model::{ProcessedVideo, VideoJob};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

pub const OWNER: &str = "user-42";

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    pub downloads: AtomicUsize,
    pub uploads: AtomicUsize,
    pub fail_download: bool,
    /// Uploads whose key ends with this fail.
    pub fail_upload_suffix: Option<String>,
}

impl MemoryStore {
    pub fn with_raw(key: &str) -> Self {
        let store = Self::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (b"raw video bytes".to_vec(), "video/mp4".to_string()));
        store
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(&self, key: &str, dest: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_download {
            tokio::fs::write(dest, b"partial").await?;
            bail!("connection reset while downloading");
        }
        let (bytes, _) = self.object(key).ok_or_else(|| anyhow!("NoSuchKey: {}", key))?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn upload(&self, key: &str, src: &Path, content_type: &str) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if let Some(suffix) = &self.fail_upload_suffix {
            if key.ends_with(suffix.as_str()) {
                bail!("access denied");
            }
        }
        let bytes = tokio::fs::read(src).await?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    pub jobs: Mutex<HashMap<Uuid, VideoJob>>,
    pub updates: Mutex<Vec<(Uuid, ProcessedVideo)>>,
    pub unreachable: bool,
    pub fail_update: bool,
    /// Simulates another delivery recording the job first.
    pub finished_elsewhere: bool,
}

impl MemoryJobs {
    pub fn with(job: VideoJob) -> Self {
        let jobs = Self::default();
        jobs.jobs.lock().unwrap().insert(job.id, job);
        jobs
    }

    pub fn updates(&self) -> Vec<(Uuid, ProcessedVideo)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for MemoryJobs {
    async fn find(&self, id: Uuid) -> Result<Option<VideoJob>> {
        if self.unreachable {
            bail!("connection refused");
        }
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn mark_processed(&self, id: Uuid, update: &ProcessedVideo) -> Result<bool> {
        if self.fail_update {
            bail!("connection refused");
        }
        if self.finished_elsewhere {
            return Ok(false);
        }
        self.updates.lock().unwrap().push((id, update.clone()));
        Ok(true)
    }
}

/// Probe, encoder and thumbnail extractor writing small placeholder files.
pub struct FakeMedia {
    pub probe: Option<SourceProbe>,
    pub fail_renditions: Mutex<Vec<String>>,
    pub probes: AtomicUsize,
    pub encoded: Mutex<Vec<String>>,
    pub thumbnails: Mutex<Vec<u64>>,
}

impl FakeMedia {
    pub fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            probe: Some(SourceProbe::new(width, height, duration)),
            fail_renditions: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
            encoded: Mutex::new(Vec::new()),
            thumbnails: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(self, name: &str) -> Self {
        self.fail_renditions.lock().unwrap().push(name.to_string());
        self
    }

    pub fn stop_failing(&self) {
        self.fail_renditions.lock().unwrap().clear();
    }

    pub fn encode_calls(&self) -> usize {
        self.encoded.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaProbe for FakeMedia {
    async fn probe(&self, path: &Path) -> Result<SourceProbe> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe runs on the downloaded file");
        self.probe.ok_or_else(|| anyhow!("moov atom not found"))
    }
}

#[async_trait]
impl RenditionEncoder for FakeMedia {
    async fn encode(
        &self,
        input: &Path,
        output_dir: &Path,
        spec: &RenditionSpec,
        _hls: &HlsParams,
    ) -> Result<PathBuf> {
        assert!(input.exists());
        self.encoded.lock().unwrap().push(spec.name.clone());

        let label = spec.resolution();
        for i in 0..2 {
            tokio::fs::write(output_dir.join(format!("{}_{:03}.ts", label, i)), b"segment").await?;
        }
        if self.fail_renditions.lock().unwrap().contains(&spec.name) {
            bail!("Conversion failed for {}", spec.name);
        }

        let manifest = output_dir.join(spec.manifest_name());
        tokio::fs::write(&manifest, format!("#EXTM3U\n{}_000.ts\n{}_001.ts\n", label, label)).await?;
        Ok(manifest)
    }
}

#[async_trait]
impl ThumbnailExtractor for FakeMedia {
    async fn extract(
        &self,
        _input: &Path,
        at_seconds: u64,
        _size: (u32, u32),
        dest: &Path,
    ) -> Result<()> {
        self.thumbnails.lock().unwrap().push(at_seconds);
        tokio::fs::write(dest, b"jpeg").await?;
        Ok(())
    }
}

pub fn raw_key(video_id: Uuid) -> String {
    format!("{}/videos/{}/raw", OWNER, video_id)
}

pub fn message_for(key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventName": "ObjectCreated:CompleteMultipartUpload",
            "s3": {
                "bucket": { "name": "videos" },
                "object": { "key": key }
            }
        }]
    })
    .to_string()
}

pub fn job(id: Uuid) -> VideoJob {
    VideoJob {
        id,
        user_id: OWNER.to_string(),
        title: "Skate session".to_string(),
        description: Some("Sunday at the park".to_string()),
        raw_key: raw_key(id),
        processed: false,
        hls_path: None,
        thumbnail_path: None,
        duration: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub struct Harness {
    pub scratch: TempDir,
    pub store: Arc<MemoryStore>,
    pub jobs: Arc<MemoryJobs>,
    pub media: Arc<FakeMedia>,
    pub transcoder: Transcoder,
}

impl Harness {
    pub fn new(store: MemoryStore, jobs: MemoryJobs, media: FakeMedia) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(store);
        let jobs = Arc::new(jobs);
        let media = Arc::new(media);

        let deps = Collaborators {
            storage: store.clone(),
            jobs: jobs.clone(),
            probe: media.clone(),
            encoder: media.clone(),
            thumbnails: media.clone(),
        };
        let transcoder = Transcoder::new(
            TranscodeSettings::default(),
            ScratchSpace::new(scratch.path()),
            deps,
        );

        Self {
            scratch,
            store,
            jobs,
            media,
            transcoder,
        }
    }

    /// Standard setup: one unprocessed job whose raw upload is in storage.
    pub fn for_video(video_id: Uuid, media: FakeMedia) -> Self {
        Self::new(
            MemoryStore::with_raw(&raw_key(video_id)),
            MemoryJobs::with(job(video_id)),
            media,
        )
    }

    pub fn raw_file(&self, video_id: Uuid) -> PathBuf {
        self.scratch.path().join("raw_files").join(video_id.to_string())
    }

    pub fn output_dir(&self, video_id: Uuid) -> PathBuf {
        self.scratch.path().join("transcoded").join(video_id.to_string())
    }
}
