//! Inbound storage notifications.
//!
//! The queue hands us an S3 "object created" notification. Raw uploads are
//! stored under `<owner>/videos/<video>/raw`, which is where the job identity
//! comes from.

use crate::modules::transcode::error::TranscodeError;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct EventEnvelope {
    /// `null` and absent both mean no records.
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<EventRecord>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub object: Option<S3Object>,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Object {
    #[serde(default)]
    pub key: Option<String>,
}

impl EventEnvelope {
    /// Parses a message body. Bodies passed through the environment sometimes
    /// arrive with their quotes still escaped, so a second attempt is made
    /// with `\"` unescaped.
    pub fn parse(body: &str) -> Result<Self, TranscodeError> {
        match serde_json::from_str(body) {
            Ok(envelope) => Ok(envelope),
            Err(first) => serde_json::from_str(&body.replace("\\\"", "\""))
                .map_err(|_| TranscodeError::InvalidEnvelope(first.to_string())),
        }
    }

    /// Upstream batches one event per message, so later records are ignored.
    pub fn first_record(&self) -> Option<&EventRecord> {
        self.records.as_deref()?.first()
    }

    /// Object key of the first record, URL-decoded.
    pub fn first_object_key(&self) -> Option<String> {
        let raw = self
            .first_record()?
            .s3
            .as_ref()?
            .object
            .as_ref()?
            .key
            .as_deref()?;

        let key = decode_object_key(raw);
        if key.is_empty() { None } else { Some(key) }
    }
}

/// S3 form-encodes keys in notifications (`+` for spaces, `%xx` escapes).
fn decode_object_key(raw: &str) -> String {
    url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

/// Where a raw upload lives and where its outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoKey {
    pub owner_id: String,
    pub video_id: Uuid,
    pub raw_key: String,
}

impl VideoKey {
    pub fn parse(key: &str) -> Result<Self, TranscodeError> {
        let malformed = || TranscodeError::MalformedKey {
            key: key.to_string(),
        };

        let segments: Vec<&str> = key.split('/').collect();
        let [owner, videos, video, raw] = segments.as_slice() else {
            return Err(malformed());
        };

        if owner.is_empty() || *videos != "videos" || *raw != "raw" {
            return Err(malformed());
        }

        let video_id = Uuid::parse_str(video).map_err(|_| malformed())?;

        Ok(Self {
            owner_id: owner.to_string(),
            video_id,
            raw_key: key.to_string(),
        })
    }

    /// `<owner>/videos/<video>`
    pub fn video_prefix(&self) -> String {
        format!("{}/videos/{}", self.owner_id, self.video_id)
    }

    pub fn hls_prefix(&self) -> String {
        format!("{}/hls", self.video_prefix())
    }

    pub fn hls_key(&self, file_name: &str) -> String {
        format!("{}/{}", self.hls_prefix(), file_name)
    }

    pub fn thumbnail_file_name(&self) -> String {
        format!("{}.jpg", self.video_id)
    }

    pub fn thumbnail_key(&self) -> String {
        format!("thumbnails/{}", self.thumbnail_file_name())
    }
}

/// Turns a message body into the job it refers to.
///
/// `Ok(None)` means there is nothing to do (no records, or no object key),
/// which happens with test notifications and placeholder triggers.
pub fn decode_event(body: &str) -> Result<Option<VideoKey>, TranscodeError> {
    let envelope = EventEnvelope::parse(body)?;

    let Some(record) = envelope.first_record() else {
        info!("No records in message body");
        return Ok(None);
    };

    let Some(key) = envelope.first_object_key() else {
        info!("No object key found in event: {:?}", record);
        return Ok(None);
    };

    if let Some(event) = &record.event_name {
        info!("Received {} for {}", event, key);
    }

    VideoKey::parse(&key).map(Some)
}
