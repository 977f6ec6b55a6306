use super::catalog::{HlsParams, RenditionSpec};
use super::error::TranscodeError;
use super::ports::RenditionEncoder;
use futures_util::future::join_all;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenditionOutcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionResult {
    pub spec: RenditionSpec,
    /// Sub-manifest file name, relative to the output directory.
    pub manifest: String,
    pub outcome: RenditionOutcome,
}

impl RenditionResult {
    pub fn is_success(&self) -> bool {
        self.outcome == RenditionOutcome::Success
    }
}

/// Outcome of every rendition of a job, in ladder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub results: Vec<RenditionResult>,
}

impl EncodeReport {
    /// A job only succeeds when every rendition did.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(RenditionResult::is_success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RenditionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn into_result(self) -> Result<Vec<RenditionResult>, TranscodeError> {
        if self.is_success() {
            return Ok(self.results);
        }

        Err(TranscodeError::EncodeFailure {
            failed: self.failed().map(|r| r.spec.name.clone()).collect(),
        })
    }
}

/// Encodes all renditions at once and waits for every one of them.
///
/// Failures do not cancel the other encodes; each outcome is collected so
/// the report names every rendition that failed.
pub async fn encode_renditions(
    encoder: &dyn RenditionEncoder,
    input: &Path,
    output_dir: &Path,
    renditions: &[RenditionSpec],
    hls: &HlsParams,
) -> EncodeReport {
    info!(
        "🎥 Transcoding to: {}",
        renditions
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let jobs = renditions.iter().map(|spec| async move {
        let outcome = match encoder.encode(input, output_dir, spec, hls).await {
            Ok(_) => RenditionOutcome::Success,
            Err(e) => {
                error!("❌ Error transcoding {}: {:#}", spec.resolution(), e);
                RenditionOutcome::Failure(format!("{:#}", e))
            }
        };

        RenditionResult {
            spec: spec.clone(),
            manifest: spec.manifest_name(),
            outcome,
        }
    });

    EncodeReport {
        results: join_all(jobs).await,
    }
}
