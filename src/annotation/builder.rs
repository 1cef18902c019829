use std::io::BufRead;
use std::path::Path;

use log::debug;

use crate::annotation::io::{open_bufread, AnnotationReader, AnnotationRecord};
use crate::annotation::regions::{Annotation, TranscriptRegions};
use crate::error::{Result, RiboError};
use crate::model::TranscriptSet;
use crate::types::{BaseRegion, Interval};

/// Collects `(transcript, region, start, end)` rows and validates them into an
/// [`Annotation`] aligned with a transcript table.
///
/// Problems are accumulated rather than returned one at a time, so that a
/// bad annotation file is reported in full by a single `build()`.
///
/// ```
/// use ribo_profile::{AnnotationBuilder, TranscriptSet};
///
/// let transcripts = TranscriptSet::new([("T1", 20u32)]).unwrap();
/// let mut builder = AnnotationBuilder::new(&transcripts);
/// builder.add("T1", "UTR5", 0, 6);
/// builder.add("T1", "CDS", 6, 15);
/// builder.add("T1", "UTR3", 15, 20);
/// let annotation = builder.build().unwrap();
/// assert_eq!(annotation.cut_points(), vec![[6, 15, 20]]);
/// ```
#[derive(Debug)]
pub struct AnnotationBuilder<'a> {
    transcripts: &'a TranscriptSet,
    rows: Vec<[Option<Interval>; 3]>,
    problems: Vec<String>,
}

impl<'a> AnnotationBuilder<'a> {
    pub fn new(transcripts: &'a TranscriptSet) -> Self {
        Self {
            transcripts,
            rows: vec![[None; 3]; transcripts.len()],
            problems: Vec::new(),
        }
    }

    /// Record one region. Unknown transcripts or labels, inverted intervals
    /// and repeated regions are noted and reported by [`Self::build`].
    pub fn add(&mut self, transcript: &str, region: &str, start: u32, end: u32) -> &mut Self {
        let region = match region.parse::<BaseRegion>() {
            Ok(r) => r,
            Err(msg) => {
                self.problems.push(format!("{transcript} : {msg}"));
                return self;
            }
        };
        let Ok(interval) = Interval::new(start, end) else {
            self.problems
                .push(format!("{transcript} : {region} start {start} is after its end {end}"));
            return self;
        };
        let Ok(id) = self.transcripts.id_of(transcript) else {
            self.problems.push(format!("{transcript} : not in the transcript length table"));
            return self;
        };

        let slot = &mut self.rows[id][region.index()];
        if slot.is_some() {
            self.problems.push(format!("{transcript} : {region} is annotated more than once"));
        } else {
            *slot = Some(interval);
        }
        self
    }

    pub fn add_record(&mut self, record: &AnnotationRecord) -> &mut Self {
        self.add(&record.transcript, &record.region, record.start, record.end)
    }

    /// Validate every transcript and produce the boundary table.
    pub fn build(self) -> Result<Annotation> {
        let Self { transcripts, rows, mut problems } = self;
        let mut regions = Vec::with_capacity(rows.len());

        for (t, row) in transcripts.iter().zip(rows) {
            if row.iter().all(Option::is_none) {
                problems.push(format!("{} : has no annotation", t.name));
                continue;
            }
            let missing: Vec<String> = BaseRegion::ALL
                .iter()
                .filter(|r| row[r.index()].is_none())
                .map(ToString::to_string)
                .collect();
            let [Some(utr5), Some(cds), Some(utr3)] = row else {
                problems.push(format!("{} : missing {}", t.name, missing.join(", ")));
                continue;
            };

            let before = problems.len();
            if utr5.start != 0 {
                problems.push(format!("{} : UTR5 must start at 0, found {}", t.name, utr5.start));
            }
            if utr5.end != cds.start {
                problems.push(format!(
                    "{} : UTR5 end ({}) and CDS start ({}) must coincide",
                    t.name, utr5.end, cds.start
                ));
            }
            if cds.end != utr3.start {
                problems.push(format!(
                    "{} : CDS end ({}) and UTR3 start ({}) must coincide",
                    t.name, cds.end, utr3.start
                ));
            }
            if cds.is_empty() {
                problems.push(format!("{} : CDS must have positive length", t.name));
            }
            if utr3.end != t.length {
                problems.push(format!(
                    "{} : UTR3 end ({}) must equal the transcript length ({})",
                    t.name, utr3.end, t.length
                ));
            }
            if problems.len() == before {
                regions.push(TranscriptRegions { utr5, cds, utr3 });
            }
        }

        if !problems.is_empty() {
            return Err(RiboError::Annotation { problems });
        }
        debug!("validated annotation for {} transcripts", regions.len());
        Ok(Annotation::from_validated(regions))
    }

    /// Read an annotation BED stream and build. Malformed lines count as
    /// annotation problems; I/O errors abort immediately.
    pub fn build_from_reader<R: BufRead>(mut self, reader: R) -> Result<Annotation> {
        for record in AnnotationReader::new(reader).records() {
            match record {
                Ok(rec) => {
                    self.add_record(&rec);
                }
                Err(RiboError::MalformedRecord { line }) => self.problems.push(line),
                Err(e) => return Err(e),
            }
        }
        self.build()
    }

    /// Like [`Self::build_from_reader`], opening `path` (gzip if it ends in `.gz`).
    pub fn build_from_path<P: AsRef<Path>>(self, path: P) -> Result<Annotation> {
        let reader = open_bufread(path)?;
        self.build_from_reader(reader)
    }
}
