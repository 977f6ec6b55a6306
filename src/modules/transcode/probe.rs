use serde::{Deserialize, Serialize};

/// What the media probe reports about the raw upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceProbe {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
}

impl SourceProbe {
    pub const MIN_DURATION_SECONDS: f64 = 1.0;

    /// Durations below one second (or not a number) are raised to one.
    pub fn new(width: u32, height: u32, duration_seconds: f64) -> Self {
        let duration_seconds = if duration_seconds.is_nan() {
            Self::MIN_DURATION_SECONDS
        } else {
            duration_seconds.max(Self::MIN_DURATION_SECONDS)
        };

        Self {
            width,
            height,
            duration_seconds,
        }
    }

    pub fn whole_seconds(&self) -> u64 {
        self.duration_seconds.floor() as u64
    }
}
