use crate::config::env::{self, EnvKey};
use crate::modules::transcode::catalog::TranscodeSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub storage: StorageConfig,
    pub scratch_dir: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub hls_segment_seconds: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
}

fn required(key: EnvKey) -> Result<String> {
    let name = key.as_str();
    env::get(key).with_context(|| format!("Missing required environment variable {}", name))
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let scratch_dir = env::get_opt(EnvKey::ScratchDir)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("hls-worker"));

        Ok(Self {
            database_url: required(EnvKey::DatabaseUrl)?,
            storage: StorageConfig {
                region: env::get_or(EnvKey::AwsRegion, "us-east-1"),
                bucket: required(EnvKey::AwsBucket)?,
                access_key: required(EnvKey::AwsAccessKey)?,
                secret_key: required(EnvKey::AwsSecretKey)?,
                endpoint: env::get_opt(EnvKey::S3Endpoint),
            },
            scratch_dir,
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            hls_segment_seconds: env::get_parsed(EnvKey::HlsSegmentSeconds, 10),
        })
    }

    /// Ladder and HLS parameters, with the segment duration taken from the environment.
    pub fn transcode_settings(&self) -> TranscodeSettings {
        let mut settings = TranscodeSettings::default();
        if self.hls_segment_seconds > 0 {
            settings.hls.segment_seconds = self.hls_segment_seconds;
        }
        settings
    }
}
