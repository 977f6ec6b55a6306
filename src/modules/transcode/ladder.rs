use super::catalog::{RenditionCatalog, RenditionSpec};
use super::probe::SourceProbe;

/// Picks every catalog entry the source can fill, smallest first.
///
/// This is a plain filter rather than a closest match: a source can qualify
/// for none, some or all entries. When nothing fits, `fallback` is returned
/// alone so that every job produces at least one rendition.
pub fn select_ladder(
    catalog: &RenditionCatalog,
    fallback: &RenditionSpec,
    source: &SourceProbe,
) -> Vec<RenditionSpec> {
    let selected: Vec<RenditionSpec> = catalog
        .entries()
        .iter()
        .filter(|spec| spec.fits_within(source.width, source.height))
        .cloned()
        .collect();

    if selected.is_empty() {
        vec![fallback.clone()]
    } else {
        selected
    }
}
