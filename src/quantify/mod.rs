//! Per-length quantification: coverage, start/stop site windows and region
//! counts for one read-length partition, and the parallel driver that runs it
//! over a whole length range.

pub mod coverage;
pub mod metagene;
pub mod parallel;
pub mod partition;
pub mod region_counts;

use std::io::BufRead;

use crate::annotation::ExtendedAnnotation;
use crate::error::{Result, RiboError};
use crate::model::TranscriptSet;
use crate::types::SiteType;

pub use coverage::{coverage_from_reader, per_transcript, CoverageBuilder};
pub use metagene::site_windows;
pub use parallel::{quantify_partitions, quantify_records, run_per_length};
pub use partition::LengthPartitions;
pub use region_counts::region_counts;

/// Everything a quantifier needs besides the reads themselves.
#[derive(Debug, Clone, Copy)]
pub struct QuantifyParams<'a> {
    pub transcripts: &'a TranscriptSet,
    pub annotation: &'a ExtendedAnnotation,
    pub radius: u32,
}

impl<'a> QuantifyParams<'a> {
    pub fn new(transcripts: &'a TranscriptSet, annotation: &'a ExtendedAnnotation, radius: u32) -> Result<Self> {
        if annotation.len() != transcripts.len() {
            return Err(RiboError::LayoutMismatch {
                what: "annotation".to_string(),
                expected: transcripts.len(),
                found: annotation.len(),
            });
        }
        Ok(Self { transcripts, annotation, radius })
    }
}

/// Quantifier output for one read length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthProfile {
    pub read_length: u32,
    /// Concatenated per-transcript coverage.
    pub coverage: Vec<u32>,
    pub start_sites: Vec<u32>,
    pub stop_sites: Vec<u32>,
    /// `n_transcripts x 5`, row-major.
    pub region_counts: Vec<u32>,
}

impl LengthProfile {
    /// Number of reads in this partition.
    pub fn total_reads(&self) -> u64 {
        self.coverage.iter().map(|&v| u64::from(v)).sum()
    }
}

/// Derive windows and region counts from one partition's coverage.
pub fn quantify_coverage(read_length: u32, coverage: Vec<u32>, params: &QuantifyParams<'_>) -> Result<LengthProfile> {
    let QuantifyParams { transcripts, annotation, radius } = *params;
    let start_sites = site_windows(&coverage, transcripts, annotation, radius, SiteType::Start)?;
    let stop_sites = site_windows(&coverage, transcripts, annotation, radius, SiteType::Stop)?;
    let region_counts = region_counts(&coverage, transcripts, annotation)?;
    Ok(LengthProfile { read_length, coverage, start_sites, stop_sites, region_counts })
}

/// Quantify one partition read from an alignment BED stream.
pub fn quantify_reader<R: BufRead>(read_length: u32, reader: R, params: &QuantifyParams<'_>) -> Result<LengthProfile> {
    let coverage = coverage_from_reader(reader, params.transcripts)?;
    quantify_coverage(read_length, coverage, params)
}
