use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::media::ffmpeg::FfmpegEngine;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::transcode::scratch::ScratchSpace;
use crate::modules::transcode::service::{Collaborators, Transcoder};
use crate::modules::video::repository::PgJobStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, storage: StorageService) -> Self {
        Self {
            config,
            db,
            storage,
        }
    }

    /// Wires the production collaborators into a transcoder.
    pub fn transcoder(&self) -> Transcoder {
        let engine = Arc::new(FfmpegEngine::new(
            self.config.ffmpeg_path.clone(),
            self.config.ffprobe_path.clone(),
        ));

        let deps = Collaborators {
            storage: Arc::new(self.storage.clone()),
            jobs: Arc::new(PgJobStore::new(self.db.clone())),
            probe: engine.clone(),
            encoder: engine.clone(),
            thumbnails: engine,
        };

        Transcoder::new(
            self.config.transcode_settings(),
            ScratchSpace::new(&self.config.scratch_dir),
            deps,
        )
    }
}
