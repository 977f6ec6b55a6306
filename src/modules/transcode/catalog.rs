use serde::{Deserialize, Serialize};

/// One candidate output profile of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    pub bandwidth: u32,
}

impl RenditionSpec {
    pub fn new(
        name: &str,
        (width, height): (u32, u32),
        fps: u32,
        video_bitrate_kbps: u32,
        audio_bitrate_kbps: u32,
        bandwidth: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            fps,
            video_bitrate_kbps,
            audio_bitrate_kbps,
            bandwidth,
        }
    }

    /// `WxH`, used both in the manifest and as the file name key.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn manifest_name(&self) -> String {
        format!("manifest_{}.m3u8", self.resolution())
    }

    /// ffmpeg segment file pattern; the resolution prefix keeps renditions apart.
    pub fn segment_pattern(&self) -> String {
        format!("{}_%03d.ts", self.resolution())
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width <= width && self.height <= height
    }
}

pub const ULD: (u32, u32) = (426, 240);
pub const LD: (u32, u32) = (640, 360);
pub const SD: (u32, u32) = (854, 480);
pub const HD: (u32, u32) = (1280, 720);
pub const FHD: (u32, u32) = (1920, 1080);

/// Ordered table of renditions, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionCatalog {
    entries: Vec<RenditionSpec>,
}

impl RenditionCatalog {
    /// Entries are ordered ascending by resolution; ties keep their given order.
    pub fn new(mut entries: Vec<RenditionSpec>) -> Self {
        entries.sort_by_key(|spec| (spec.height, spec.width));
        Self { entries }
    }

    pub fn entries(&self) -> &[RenditionSpec] {
        &self.entries
    }
}

impl Default for RenditionCatalog {
    fn default() -> Self {
        Self::new(vec![
            RenditionSpec::new("360p", LD, 30, 750, 64, 700_000),
            RenditionSpec::new("480p", SD, 30, 1200, 96, 1_200_000),
            RenditionSpec::new("720p", HD, 60, 2500, 128, 2_500_000),
            RenditionSpec::new("1080p", FHD, 60, 4500, 192, 4_500_000),
        ])
    }
}

/// Static resolution -> bandwidth estimate used in the master manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandwidthTable {
    limits: Vec<((u32, u32), u32)>,
}

impl BandwidthTable {
    pub fn new(limits: Vec<((u32, u32), u32)>) -> Self {
        Self { limits }
    }

    pub fn lookup(&self, width: u32, height: u32) -> Option<u32> {
        self.limits
            .iter()
            .find(|(res, _)| *res == (width, height))
            .map(|(_, bandwidth)| *bandwidth)
    }

    /// Table value for the rendition, or its own estimate when the table has no row.
    pub fn for_spec(&self, spec: &RenditionSpec) -> u32 {
        self.lookup(spec.width, spec.height).unwrap_or(spec.bandwidth)
    }
}

impl Default for BandwidthTable {
    fn default() -> Self {
        Self::new(vec![
            (ULD, 400_000),
            (LD, 700_000),
            (SD, 1_200_000),
            (HD, 2_500_000),
            (FHD, 4_500_000),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsParams {
    pub segment_seconds: u32,
    /// 0 keeps every segment in the playlist.
    pub list_size: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for HlsParams {
    fn default() -> Self {
        Self {
            segment_seconds: 10,
            list_size: 0,
            video_codec: "h264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSettings {
    pub catalog: RenditionCatalog,
    /// Produced alone when the source is smaller than every catalog entry.
    pub fallback: RenditionSpec,
    pub bandwidth: BandwidthTable,
    pub hls: HlsParams,
    pub thumbnail_size: (u32, u32),
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            catalog: RenditionCatalog::default(),
            fallback: RenditionSpec::new("240p", ULD, 24, 400, 64, 400_000),
            bandwidth: BandwidthTable::default(),
            hls: HlsParams::default(),
            thumbnail_size: HD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_ascending() {
        let catalog = RenditionCatalog::default();
        let names: Vec<&str> = catalog.entries().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["360p", "480p", "720p", "1080p"]);
    }

    #[test]
    fn test_catalog_sorts_unordered_input() {
        let catalog = RenditionCatalog::new(vec![
            RenditionSpec::new("720p", HD, 60, 2500, 128, 2_500_000),
            RenditionSpec::new("360p", LD, 30, 750, 64, 700_000),
        ]);
        assert_eq!(catalog.entries()[0].name, "360p");
        assert_eq!(catalog.entries()[1].name, "720p");
    }

    #[test]
    fn test_file_names_carry_resolution() {
        let spec = RenditionSpec::new("720p", HD, 60, 2500, 128, 2_500_000);
        assert_eq!(spec.resolution(), "1280x720");
        assert_eq!(spec.manifest_name(), "manifest_1280x720.m3u8");
        assert_eq!(spec.segment_pattern(), "1280x720_%03d.ts");
    }

    #[test]
    fn test_bandwidth_lookup_falls_back_to_spec() {
        let table = BandwidthTable::default();
        assert_eq!(table.lookup(426, 240), Some(400_000));
        assert_eq!(table.lookup(100, 100), None);

        let odd = RenditionSpec::new("odd", (100, 100), 24, 100, 32, 123);
        assert_eq!(table.for_spec(&odd), 123);
    }
}
