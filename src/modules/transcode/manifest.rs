use super::catalog::{BandwidthTable, RenditionSpec};

pub const MASTER_MANIFEST_NAME: &str = "master.m3u8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterManifestEntry {
    pub bandwidth: u32,
    pub resolution: String,
    pub manifest: String,
}

/// Builds the master playlist entries in the order the renditions were selected.
pub fn manifest_entries(
    renditions: &[RenditionSpec],
    bandwidth: &BandwidthTable,
) -> Vec<MasterManifestEntry> {
    renditions
        .iter()
        .map(|spec| MasterManifestEntry {
            bandwidth: bandwidth.for_spec(spec),
            resolution: spec.resolution(),
            manifest: spec.manifest_name(),
        })
        .collect()
}

/// Renders the master playlist as lines.
///
/// The header is followed by a blank line, then one `EXT-X-STREAM-INF` line
/// and the sub-manifest name per rendition. Bandwidth is the static estimate
/// from `bandwidth`, not a measured value.
pub fn master_manifest_lines(
    renditions: &[RenditionSpec],
    bandwidth: &BandwidthTable,
) -> Vec<String> {
    let mut lines = vec!["#EXTM3U".to_string(), "#EXT-X-VERSION:3".to_string(), String::new()];

    for entry in manifest_entries(renditions, bandwidth) {
        lines.push(format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}",
            entry.bandwidth, entry.resolution
        ));
        lines.push(entry.manifest);
    }

    lines
}

pub fn master_manifest(renditions: &[RenditionSpec], bandwidth: &BandwidthTable) -> String {
    master_manifest_lines(renditions, bandwidth).join("\n")
}
