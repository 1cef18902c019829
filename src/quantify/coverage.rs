use std::io::BufRead;

use crate::annotation::io::{AlignmentReader, AlignmentRecord};
use crate::error::{Result, RiboError};
use crate::model::{ByTranscript, TranscriptSet};

/// Counts 5' ends per nucleotide for one read-length partition.
///
/// Counts for all transcripts live in one concatenated slice, transcript `i`
/// at [`TranscriptSet::span`]`(i)`.
#[derive(Debug, Clone)]
pub struct CoverageBuilder<'a> {
    transcripts: &'a TranscriptSet,
    counts: Vec<u32>,
    reads: u64,
}

impl<'a> CoverageBuilder<'a> {
    pub fn new(transcripts: &'a TranscriptSet) -> Self {
        Self {
            transcripts,
            counts: vec![0; transcripts.total_length()],
            reads: 0,
        }
    }

    /// Count one 5' end. The transcript must exist and the position must lie
    /// inside it.
    pub fn add(&mut self, reference: &str, five_prime: u32) -> Result<()> {
        let id = self.transcripts.id_of(reference)?;
        let length = self.transcripts.length(id);
        if five_prime >= length {
            return Err(RiboError::PositionOutOfRange {
                transcript: reference.to_string(),
                position: five_prime,
                length,
            });
        }
        let cell = &mut self.counts[self.transcripts.offset(id) + five_prime as usize];
        *cell = cell.saturating_add(1);
        self.reads += 1;
        Ok(())
    }

    pub fn add_record(&mut self, record: &AlignmentRecord) -> Result<()> {
        self.add(&record.reference, record.five_prime)
    }

    /// Number of 5' ends counted so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn finish(self) -> Vec<u32> {
        self.counts
    }
}

/// Build the coverage slice of one partition from an alignment BED stream.
/// Every record is counted regardless of its read length.
pub fn coverage_from_reader<R: BufRead>(reader: R, transcripts: &TranscriptSet) -> Result<Vec<u32>> {
    let mut builder = CoverageBuilder::new(transcripts);
    for record in AlignmentReader::new(reader).records() {
        builder.add_record(&record?)?;
    }
    Ok(builder.finish())
}

/// View a concatenated coverage slice as one sub-slice per transcript.
pub fn per_transcript<'a, 'c>(
    coverage: &'c [u32],
    transcripts: &'a TranscriptSet,
) -> Result<ByTranscript<'a, &'c [u32]>> {
    if coverage.len() != transcripts.total_length() {
        return Err(RiboError::LayoutMismatch {
            what: "coverage".to_string(),
            expected: transcripts.total_length(),
            found: coverage.len(),
        });
    }
    let rows = (0..transcripts.len()).map(|t| &coverage[transcripts.span(t)]).collect();
    ByTranscript::new(transcripts, rows)
}
