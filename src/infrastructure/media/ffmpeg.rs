//! ffmpeg / ffprobe backed media operations.

use crate::modules::transcode::catalog::{HlsParams, RenditionSpec};
use crate::modules::transcode::ports::{MediaProbe, RenditionEncoder, ThumbnailExtractor};
use crate::modules::transcode::probe::SourceProbe;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Lines of ffmpeg stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: String,
    ffprobe_path: String,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn probe_args(input: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=width,height:format=duration".to_string(),
            "-of".to_string(),
            "json".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// Arguments for one HLS rendition. Output names carry the resolution so
    /// renditions sharing a directory never overwrite each other.
    pub fn hls_args(
        input: &Path,
        output_dir: &Path,
        spec: &RenditionSpec,
        hls: &HlsParams,
    ) -> Vec<String> {
        let segment_path = output_dir.join(spec.segment_pattern());
        let manifest_path = output_dir.join(spec.manifest_name());

        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", spec.width, spec.height),
            "-r".to_string(),
            spec.fps.to_string(),
            "-b:v".to_string(),
            format!("{}k", spec.video_bitrate_kbps),
            "-b:a".to_string(),
            format!("{}k", spec.audio_bitrate_kbps),
            "-c:v".to_string(),
            hls.video_codec.clone(),
            "-c:a".to_string(),
            hls.audio_codec.clone(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            hls.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            hls.list_size.to_string(),
            "-hls_segment_filename".to_string(),
            segment_path.to_string_lossy().to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            manifest_path.to_string_lossy().to_string(),
        ]
    }

    pub fn thumbnail_args(input: &Path, at_seconds: u64, size: (u32, u32), dest: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            at_seconds.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-s".to_string(),
            format!("{}x{}", size.0, size.1),
            "-loglevel".to_string(),
            "error".to_string(),
            dest.to_string_lossy().to_string(),
        ]
    }

    /// Runs a tool to completion. Children are killed if the future is dropped.
    async fn run(&self, program: &str, args: &[String]) -> Result<Vec<u8>> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr_tail(&output.stderr)
            );
        }

        Ok(output.stdout)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

pub fn parse_probe_output(json: &[u8]) -> Result<SourceProbe> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).context("Failed to parse ffprobe output")?;

    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => bail!("Video stream has no resolution"),
    };

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or_else(|| anyhow!("No duration found"))?;

    Ok(SourceProbe::new(width, height, duration))
}

#[async_trait]
impl MediaProbe for FfmpegEngine {
    async fn probe(&self, path: &Path) -> Result<SourceProbe> {
        let stdout = self.run(&self.ffprobe_path, &Self::probe_args(path)).await?;
        parse_probe_output(&stdout)
    }
}

#[async_trait]
impl RenditionEncoder for FfmpegEngine {
    async fn encode(
        &self,
        input: &Path,
        output_dir: &Path,
        spec: &RenditionSpec,
        hls: &HlsParams,
    ) -> Result<PathBuf> {
        info!("🎥 Transcoding into {} ({})...", spec.name, spec.resolution());
        let args = Self::hls_args(input, output_dir, spec, hls);
        self.run(&self.ffmpeg_path, &args).await?;
        info!("🎥 Transcoding complete for {}", spec.resolution());

        Ok(output_dir.join(spec.manifest_name()))
    }
}

#[async_trait]
impl ThumbnailExtractor for FfmpegEngine {
    async fn extract(
        &self,
        input: &Path,
        at_seconds: u64,
        size: (u32, u32),
        dest: &Path,
    ) -> Result<()> {
        info!("🖼️ Generating thumbnail at {}s", at_seconds);
        let args = Self::thumbnail_args(input, at_seconds, size, dest);
        self.run(&self.ffmpeg_path, &args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::transcode::catalog::TranscodeSettings;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "programs": [],
            "streams": [{ "width": 1920, "height": 1080 }],
            "format": { "duration": "65.432000" }
        }"#;
        let probe = parse_probe_output(json).unwrap();
        assert_eq!((probe.width, probe.height), (1920, 1080));
        assert!((probe.duration_seconds - 65.432).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_clamps_short_duration() {
        let json = br#"{"streams": [{"width": 640, "height": 360}], "format": {"duration": "0.2"}}"#;
        assert_eq!(parse_probe_output(json).unwrap().duration_seconds, 1.0);
    }

    #[test]
    fn test_parse_probe_rejects_missing_data() {
        assert!(parse_probe_output(br#"{"streams": [], "format": {"duration": "3"}}"#).is_err());
        assert!(parse_probe_output(br#"{"streams": [{"width": 640}], "format": {"duration": "3"}}"#).is_err());
        assert!(parse_probe_output(br#"{"streams": [{"width": 640, "height": 360}]}"#).is_err());
        assert!(parse_probe_output(b"garbage").is_err());
    }

    #[test]
    fn test_hls_args() {
        let settings = TranscodeSettings::default();
        let spec = &settings.catalog.entries()[2];
        let args = FfmpegEngine::hls_args(
            Path::new("/scratch/raw_files/abc"),
            Path::new("/scratch/transcoded/abc"),
            spec,
            &settings.hls,
        );

        let pairs: Vec<(&str, &str)> = args
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        assert!(pairs.contains(&("-vf", "scale=1280:720")));
        assert!(pairs.contains(&("-r", "60")));
        assert!(pairs.contains(&("-b:v", "2500k")));
        assert!(pairs.contains(&("-b:a", "128k")));
        assert!(pairs.contains(&("-f", "hls")));
        assert!(pairs.contains(&("-hls_time", "10")));
        assert!(pairs.contains(&("-hls_list_size", "0")));
        assert!(pairs.contains(&("-c:v", "h264")));
        assert!(pairs.contains(&("-c:a", "aac")));
        assert!(pairs.contains(&(
            "-hls_segment_filename",
            "/scratch/transcoded/abc/1280x720_%03d.ts"
        )));
        assert_eq!(
            args.last().map(String::as_str),
            Some("/scratch/transcoded/abc/manifest_1280x720.m3u8")
        );
    }

    #[test]
    fn test_thumbnail_args() {
        let args = FfmpegEngine::thumbnail_args(
            Path::new("/in"),
            42,
            (1280, 720),
            Path::new("/out/x.jpg"),
        );
        assert_eq!(&args[..5], &["-y", "-ss", "42", "-i", "/in"]);
        assert!(args.contains(&"1280x720".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/out/x.jpg"));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(stderr.as_bytes());
        assert!(tail.starts_with("line 30"));
        assert!(tail.ends_with("line 49"));
    }
}
