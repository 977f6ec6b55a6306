use std::env;
use std::str::FromStr;
use tracing::warn;

pub enum EnvKey {
    MessageBody,
    DatabaseUrl,
    AwsAccessKey,
    AwsSecretKey,
    AwsRegion,
    AwsBucket,
    S3Endpoint,
    ScratchDir,
    FfmpegPath,
    FfprobePath,
    HlsSegmentSeconds,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::MessageBody => "MSG_BODY",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::AwsAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::AwsSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::AwsRegion => "AWS_BUCKET_REGION",
            EnvKey::AwsBucket => "AWS_BUCKET_NAME",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::ScratchDir => "SCRATCH_DIR",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::HlsSegmentSeconds => "HLS_SEGMENT_SECONDS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Like [`get`], but treats an empty value as unset.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Parses the variable, falling back to `default` when it is unset or invalid.
pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    let name = key.as_str();
    parse_or(name, get_opt(key), default)
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using the default", name, raw);
            default
        }
    }
}
