//! RNA-seq expression per extended region, stored next to a ribosome profile.

use std::io::BufRead;

use log::info;

use crate::annotation::io::{content_lines, malformed};
use crate::annotation::ExtendedAnnotation;
use crate::error::{Result, RiboError};
use crate::model::TranscriptSet;
use crate::quantify::{coverage_from_reader, region_counts};
use crate::types::{Region, REGION_COUNT};

/// Read a counts table: `transcript UTR5 UTR5_junction CDS UTR3_junction UTR3`.
///
/// Only the last six columns of a line are used, so leading columns (such as
/// an experiment name) are allowed. A first line naming UTR5, CDS and UTR3 is
/// treated as a header. Transcripts missing from the table get zeros.
pub fn rnaseq_from_table<R: BufRead>(reader: R, transcripts: &TranscriptSet) -> Result<Vec<f32>> {
    let mut table = vec![0f32; transcripts.len() * REGION_COUNT];
    let mut first = true;
    let mut rows = 0usize;

    for item in content_lines(reader) {
        let (line_no, line) = item?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if std::mem::take(&mut first) && is_header(&fields) {
            continue;
        }
        if fields.len() < REGION_COUNT + 1 {
            return Err(malformed(line_no, &line, "expected a transcript name and 5 region values"));
        }
        let tail = &fields[fields.len() - (REGION_COUNT + 1)..];
        let id = transcripts.id_of(tail[0])?;
        let row = &mut table[id * REGION_COUNT..(id + 1) * REGION_COUNT];
        for (slot, value) in row.iter_mut().zip(&tail[1..]) {
            *slot = value
                .parse()
                .map_err(|_| malformed(line_no, &line, "region value is not a number"))?;
        }
        rows += 1;
    }
    info!("read RNA-seq values for {rows} of {} transcripts", transcripts.len());
    Ok(table)
}

fn is_header(fields: &[&str]) -> bool {
    let upper: Vec<String> = fields.iter().map(|f| f.to_ascii_uppercase()).collect();
    [Region::Utr5, Region::Cds, Region::Utr3]
        .iter()
        .all(|r| upper.iter().any(|f| f == r.name()))
}

/// Quantify RNA-seq alignments (all read lengths together) into the same
/// five regions used for the ribosome profile.
pub fn rnaseq_from_alignments<R: BufRead>(
    reader: R,
    transcripts: &TranscriptSet,
    annotation: &ExtendedAnnotation,
) -> Result<Vec<f32>> {
    if annotation.len() != transcripts.len() {
        return Err(RiboError::LayoutMismatch {
            what: "annotation".to_string(),
            expected: transcripts.len(),
            found: annotation.len(),
        });
    }
    let coverage = coverage_from_reader(reader, transcripts)?;
    let counts = region_counts(&coverage, transcripts, annotation)?;
    Ok(counts.into_iter().map(|v| v as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use std::io::Cursor;

    fn transcripts() -> TranscriptSet {
        TranscriptSet::new([("GAPDH", 20u32), ("MYC", 10)]).unwrap()
    }

    #[test]
    fn table_with_header_and_missing_rows() {
        let data = "transcript\tUTR5\tUTR5_junction\tCDS\tUTR3_junction\tUTR3\nMYC\t2.5\t7.2\t78\t4\t1.2\n";
        let table = rnaseq_from_table(Cursor::new(data), &transcripts()).unwrap();
        assert_eq!(&table[..5], &[0.0; 5]);
        assert_eq!(&table[5..], &[2.5, 7.2, 78.0, 4.0, 1.2]);
    }

    #[test]
    fn leading_columns_are_ignored() {
        let data = "exp1 GAPDH 1 2 3 4 5\n";
        let table = rnaseq_from_table(Cursor::new(data), &transcripts()).unwrap();
        assert_eq!(&table[..5], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn unknown_transcripts_and_short_rows_fail() {
        assert!(matches!(
            rnaseq_from_table(Cursor::new("TP53 1 2 3 4 5\n"), &transcripts()),
            Err(RiboError::UnknownTranscript { .. })
        ));
        assert!(matches!(
            rnaseq_from_table(Cursor::new("MYC 1 2 3 4\n"), &transcripts()),
            Err(RiboError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn alignments_are_counted_per_region() {
        let set = transcripts();
        let ext = Annotation::from_cut_points(&set, &[[6, 15, 20], [2, 8, 10]])
            .unwrap()
            .extended(3, 2);
        let bed = "GAPDH 10 60 r 0 +\nGAPDH 0 30 r 0 +\nMYC 9 40 r 0 +\n";
        let table = rnaseq_from_alignments(Cursor::new(bed), &set, &ext).unwrap();
        assert_eq!(&table[..5], &[1.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(table[5..].iter().sum::<f32>(), 1.0);
    }
}
