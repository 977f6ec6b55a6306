use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Local working area of the worker.
///
/// ```text
/// <root>/raw_files/<video>        downloaded upload
/// <root>/transcoded/<video>/      HLS output tree
/// <root>/thumbnails/<video>.jpg   generated preview
/// ```
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_file(&self, video_id: Uuid) -> PathBuf {
        self.root.join("raw_files").join(video_id.to_string())
    }

    pub fn output_dir(&self, video_id: Uuid) -> PathBuf {
        self.root.join("transcoded").join(video_id.to_string())
    }

    pub fn thumbnail_file(&self, file_name: &str) -> PathBuf {
        self.root.join("thumbnails").join(file_name)
    }

    /// Creates the parent directory of the raw download and drops any file
    /// left there by an earlier attempt.
    pub async fn prepare_raw_file(&self, video_id: Uuid) -> io::Result<PathBuf> {
        let path = self.raw_file(video_id);
        ensure_parent(&path).await?;
        remove_file_if_exists(&path).await?;
        Ok(path)
    }

    /// Returns an empty output directory for the video.
    pub async fn fresh_output_dir(&self, video_id: Uuid) -> io::Result<PathBuf> {
        let dir = self.output_dir(video_id);
        if fs::try_exists(&dir).await? {
            warn!("Removing stale output from a previous attempt: {}", dir.display());
            fs::remove_dir_all(&dir).await?;
        }
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    pub async fn prepare_thumbnail_file(&self, file_name: &str) -> io::Result<PathBuf> {
        let path = self.thumbnail_file(file_name);
        ensure_parent(&path).await?;
        Ok(path)
    }

    /// Best effort: a leftover raw file only costs disk until the next attempt.
    pub async fn discard_raw_file(&self, video_id: Uuid) {
        let path = self.raw_file(video_id);
        match remove_file_if_exists(&path).await {
            Ok(true) => info!("🧹 Removed raw file {}", path.display()),
            Ok(false) => {}
            Err(e) => warn!("Failed to remove raw file {}: {}", path.display(), e),
        }
    }
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// `Ok(true)` when a file was removed.
pub async fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
