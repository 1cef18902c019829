use crate::annotation::ExtendedAnnotation;
use crate::error::Result;
use crate::layout::{window_width, Rows};
use crate::model::TranscriptSet;
use crate::types::SiteType;

/// Coverage around the start or stop site of every transcript.
///
/// Row `t` has `2 * radius + 1` values; value `i` is the coverage at
/// `pivot - radius + i`, or 0 when that position falls outside
/// `[UTR5.start, UTR3.end)` of the same transcript.
pub fn site_windows(
    coverage: &[u32],
    transcripts: &TranscriptSet,
    annotation: &ExtendedAnnotation,
    radius: u32,
    site: SiteType,
) -> Result<Vec<u32>> {
    Rows::per_nucleotide(transcripts).check("coverage", coverage.len())?;
    let rows = Rows::uniform(transcripts.len(), window_width(radius));
    let mut out = vec![0u32; rows.slice_len()];

    for t in 0..transcripts.len() {
        let regions = annotation.get(t);
        let pivot = match site {
            SiteType::Start => regions.base.cds.start,
            SiteType::Stop => regions.base.cds.end,
        };
        let bounds = regions.bounds();
        let cov = &coverage[transcripts.span(t)];
        let window = &mut out[rows.row(t)];

        let first = i64::from(pivot) - i64::from(radius);
        for (i, slot) in window.iter_mut().enumerate() {
            let pos = first + i as i64;
            if bounds.contains_pos(pos) {
                *slot = cov[pos as usize];
            }
        }
    }
    Ok(out)
}
