//! Offset arithmetic for the flat profile arrays.
//!
//! Every persisted array is a sequence of read-length slices (`length_min`
//! first), and each slice is a sequence of per-transcript rows in transcript
//! order. Rows either have a fixed width (site windows, region counts) or the
//! transcript's own length (coverage). Nothing outside this module computes
//! an index into those arrays.

use std::ops::Range;

use crate::error::{Result, RiboError};
use crate::model::{TranscriptId, TranscriptSet};
use crate::types::{ReadLengthRange, REGION_COUNT};

/// Width of a start/stop site window for a metagene radius.
#[inline]
pub fn window_width(radius: u32) -> usize {
    2 * radius as usize + 1
}

/// Row geometry inside one read-length slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rows {
    /// `count` rows of `width` values each.
    Uniform { count: usize, width: usize },
    /// Row `i` spans `offsets[i]..offsets[i + 1]`.
    Ragged { offsets: Vec<usize> },
}

impl Rows {
    pub fn uniform(count: usize, width: usize) -> Self {
        Rows::Uniform { count, width }
    }

    /// One row per transcript, sized to the transcript length.
    pub fn per_nucleotide(transcripts: &TranscriptSet) -> Self {
        let mut offsets = Vec::with_capacity(transcripts.len() + 1);
        offsets.extend((0..transcripts.len()).map(|t| transcripts.offset(t)));
        offsets.push(transcripts.total_length());
        Rows::Ragged { offsets }
    }

    pub fn count(&self) -> usize {
        match self {
            Rows::Uniform { count, .. } => *count,
            Rows::Ragged { offsets } => offsets.len() - 1,
        }
    }

    /// Number of values in one read-length slice.
    pub fn slice_len(&self) -> usize {
        match self {
            Rows::Uniform { count, width } => count * width,
            Rows::Ragged { offsets } => offsets[offsets.len() - 1],
        }
    }

    /// Fixed row width, if the rows are uniform.
    pub fn width(&self) -> Option<usize> {
        match self {
            Rows::Uniform { width, .. } => Some(*width),
            Rows::Ragged { .. } => None,
        }
    }

    /// Range of row `t` within a slice.
    #[inline]
    pub fn row(&self, t: TranscriptId) -> Range<usize> {
        match self {
            Rows::Uniform { width, .. } => t * width..(t + 1) * width,
            Rows::Ragged { offsets } => offsets[t]..offsets[t + 1],
        }
    }

    pub fn check(&self, what: &str, found: usize) -> Result<()> {
        check_len(what, self.slice_len(), found)
    }
}

/// A full length-major array: one [`Rows`] slice per read length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLayout {
    lengths: ReadLengthRange,
    rows: Rows,
}

impl FlatLayout {
    pub fn new(lengths: ReadLengthRange, rows: Rows) -> Self {
        Self { lengths, rows }
    }

    pub fn site_windows(lengths: ReadLengthRange, transcripts: &TranscriptSet, radius: u32) -> Self {
        Self::new(lengths, Rows::uniform(transcripts.len(), window_width(radius)))
    }

    pub fn region_counts(lengths: ReadLengthRange, transcripts: &TranscriptSet) -> Self {
        Self::new(lengths, Rows::uniform(transcripts.len(), REGION_COUNT))
    }

    pub fn coverage(lengths: ReadLengthRange, transcripts: &TranscriptSet) -> Self {
        Self::new(lengths, Rows::per_nucleotide(transcripts))
    }

    pub fn lengths(&self) -> ReadLengthRange {
        self.lengths
    }

    pub fn rows(&self) -> &Rows {
        &self.rows
    }

    pub fn slice_len(&self) -> usize {
        self.rows.slice_len()
    }

    pub fn total_len(&self) -> usize {
        self.lengths.count() * self.rows.slice_len()
    }

    /// Range of the slice for absolute read length `length`.
    /// Callers validate `length` against [`FlatLayout::lengths`] first.
    #[inline]
    pub fn slice(&self, length: u32) -> Range<usize> {
        self.slice_at(self.lengths.relative(length))
    }

    /// Range of the slice at index `rel` relative to `length_min`.
    #[inline]
    pub fn slice_at(&self, rel: usize) -> Range<usize> {
        let n = self.rows.slice_len();
        rel * n..(rel + 1) * n
    }

    /// Range of one (length, transcript) row in the whole array.
    #[inline]
    pub fn cell(&self, length: u32, t: TranscriptId) -> Range<usize> {
        let base = self.slice(length).start;
        let row = self.rows.row(t);
        base + row.start..base + row.end
    }

    pub fn check(&self, what: &str, found: usize) -> Result<()> {
        check_len(what, self.total_len(), found)
    }
}

fn check_len(what: &str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(RiboError::LayoutMismatch { what: what.to_string(), expected, found });
    }
    Ok(())
}
