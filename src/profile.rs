//! Concatenation of per-length quantifier outputs into the flat profile arrays.

use log::info;

use crate::error::{Result, RiboError};
use crate::layout::FlatLayout;
use crate::model::TranscriptSet;
use crate::quantify::LengthProfile;
use crate::types::ReadLengthRange;

/// The flat arrays of one experiment, length-major then transcript-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileArrays {
    pub total_reads: u64,
    pub start_sites: Vec<u32>,
    pub stop_sites: Vec<u32>,
    pub region_counts: Vec<u32>,
    pub coverage: Option<Vec<u32>>,
}

/// Lays per-length results out in ascending length order.
#[derive(Debug, Clone)]
pub struct ProfileWriter<'a> {
    transcripts: &'a TranscriptSet,
    lengths: ReadLengthRange,
    radius: u32,
    keep_coverage: bool,
}

impl<'a> ProfileWriter<'a> {
    pub fn new(transcripts: &'a TranscriptSet, lengths: ReadLengthRange, radius: u32) -> Self {
        Self { transcripts, lengths, radius, keep_coverage: true }
    }

    pub fn keep_coverage(mut self, keep: bool) -> Self {
        self.keep_coverage = keep;
        self
    }

    /// Concatenate `profiles`, which may arrive in any order.
    ///
    /// Every length of the range must be present exactly once and every
    /// array must have the size implied by the transcript table.
    pub fn write(&self, mut profiles: Vec<LengthProfile>) -> Result<ProfileArrays> {
        profiles.sort_by_key(|p| p.read_length);
        self.check_lengths(&profiles)?;

        let windows = FlatLayout::site_windows(self.lengths, self.transcripts, self.radius);
        let counts = FlatLayout::region_counts(self.lengths, self.transcripts);
        let coverage = FlatLayout::coverage(self.lengths, self.transcripts);

        for p in &profiles {
            windows.rows().check("start_site_coverage", p.start_sites.len())?;
            windows.rows().check("stop_site_coverage", p.stop_sites.len())?;
            counts.rows().check("region_counts", p.region_counts.len())?;
            coverage.rows().check("coverage", p.coverage.len())?;
        }

        let mut out = ProfileArrays {
            total_reads: 0,
            start_sites: Vec::with_capacity(windows.total_len()),
            stop_sites: Vec::with_capacity(windows.total_len()),
            region_counts: Vec::with_capacity(counts.total_len()),
            coverage: self.keep_coverage.then(|| Vec::with_capacity(coverage.total_len())),
        };
        for p in profiles {
            out.total_reads += p.total_reads();
            out.start_sites.extend_from_slice(&p.start_sites);
            out.stop_sites.extend_from_slice(&p.stop_sites);
            out.region_counts.extend_from_slice(&p.region_counts);
            if let Some(cov) = out.coverage.as_mut() {
                cov.extend_from_slice(&p.coverage);
            }
        }

        info!(
            "profile for {} transcripts over lengths {}: {} reads, coverage {}",
            self.transcripts.len(),
            self.lengths,
            out.total_reads,
            if self.keep_coverage { "kept" } else { "dropped" }
        );
        Ok(out)
    }

    fn check_lengths(&self, sorted: &[LengthProfile]) -> Result<()> {
        let got: Vec<u32> = sorted.iter().map(|p| p.read_length).collect();
        let expected: Vec<u32> = self.lengths.lengths().collect();
        if got == expected {
            return Ok(());
        }
        let missing: Vec<String> = expected
            .iter()
            .filter(|l| !got.contains(l))
            .map(ToString::to_string)
            .collect();
        let duplicated: Vec<String> = got
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0].to_string())
            .collect();
        let outside: Vec<String> = got
            .iter()
            .filter(|l| !self.lengths.contains(**l))
            .map(ToString::to_string)
            .collect();
        Err(RiboError::InvalidParameter {
            parameter: "read_lengths".to_string(),
            reason: format!(
                "per-length results do not cover {} exactly once (missing: [{}], duplicated: [{}], outside: [{}])",
                self.lengths,
                missing.join(", "),
                duplicated.join(", "),
                outside.join(", ")
            ),
        })
    }
}
