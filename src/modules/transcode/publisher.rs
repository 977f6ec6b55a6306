use super::error::TranscodeError;
use super::ports::ObjectStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub fn content_type_for(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts") => "video/mp2t".to_string(),
        Some("m3u8") => "application/x-mpegURL".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// Files under `dir` with their `/`-joined path relative to it, sorted.
async fn list_files(dir: &Path) -> Result<Vec<(PathBuf, String)>, TranscodeError> {
    let mut files = Vec::new();
    let mut pending = vec![(dir.to_path_buf(), String::new())];

    while let Some((current, prefix)) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), relative));
            } else {
                files.push((entry.path(), relative));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Uploads every file under `dir` to `<prefix>/<relative path>`.
///
/// Uploads run one at a time and each local file is removed as soon as its
/// own upload succeeded, so disk usage shrinks while publishing. The first
/// failed upload stops the walk; files already uploaded stay in storage and
/// get overwritten by the next attempt.
pub async fn upload_dir(
    store: &dyn ObjectStore,
    dir: &Path,
    prefix: &str,
) -> Result<Vec<String>, TranscodeError> {
    let files = list_files(dir).await?;
    let mut uploaded = Vec::with_capacity(files.len());

    for (path, relative) in files {
        let key = format!("{}/{}", prefix, relative);
        store
            .upload(&key, &path, &content_type_for(&path))
            .await
            .map_err(|e| TranscodeError::UploadFailure {
                key: key.clone(),
                reason: format!("{:#}", e),
            })?;

        fs::remove_file(&path).await?;
        uploaded.push(key);
    }

    info!("⬆️ Uploaded {} files to {}", uploaded.len(), prefix);
    Ok(uploaded)
}
