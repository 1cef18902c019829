use crate::annotation::ExtendedAnnotation;
use crate::error::Result;
use crate::layout::Rows;
use crate::model::TranscriptSet;
use crate::types::REGION_COUNT;

/// Sum coverage over the five extended regions of every transcript.
///
/// Row `t` holds UTR5, UTR5_junction, CDS, UTR3_junction, UTR3 in that
/// order. Totals above `u32::MAX` saturate.
pub fn region_counts(
    coverage: &[u32],
    transcripts: &TranscriptSet,
    annotation: &ExtendedAnnotation,
) -> Result<Vec<u32>> {
    Rows::per_nucleotide(transcripts).check("coverage", coverage.len())?;
    let rows = Rows::uniform(transcripts.len(), REGION_COUNT);
    let mut out = vec![0u32; rows.slice_len()];

    for t in 0..transcripts.len() {
        let cov = &coverage[transcripts.span(t)];
        let row = &mut out[rows.row(t)];
        for (slot, (_, interval)) in row.iter_mut().zip(annotation.get(t).iter()) {
            let total: u64 = cov[interval.range()].iter().map(|&v| u64::from(v)).sum();
            *slot = u32::try_from(total).unwrap_or(u32::MAX);
        }
    }
    Ok(out)
}
