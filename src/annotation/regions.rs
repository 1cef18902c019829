use crate::error::{Result, RiboError};
use crate::model::{ByTranscript, TranscriptId, TranscriptSet};
use crate::types::{BaseRegion, Interval, Region, REGION_COUNT};

/// UTR5 / CDS / UTR3 of one transcript, contiguous and covering `[0, length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptRegions {
    pub utr5: Interval,
    pub cds: Interval,
    pub utr3: Interval,
}

impl TranscriptRegions {
    /// Rebuild from the persisted `[UTR5 end, CDS end, transcript length]` form.
    pub fn from_cut_points(cut: [u32; 3]) -> Self {
        let [utr5_end, cds_end, length] = cut;
        Self {
            utr5: Interval { start: 0, end: utr5_end },
            cds: Interval { start: utr5_end, end: cds_end },
            utr3: Interval { start: cds_end, end: length },
        }
    }

    pub fn cut_points(&self) -> [u32; 3] {
        [self.utr5.end, self.cds.end, self.utr3.end]
    }

    pub fn get(&self, region: BaseRegion) -> Interval {
        match region {
            BaseRegion::Utr5 => self.utr5,
            BaseRegion::Cds => self.cds,
            BaseRegion::Utr3 => self.utr3,
        }
    }

    /// Split the CDS margins into junction regions.
    ///
    /// Every bound is clamped so that each of the five intervals stays inside
    /// `[UTR5.start, UTR3.end)` and none is inverted, whatever the spans and
    /// UTR lengths.
    pub fn extend(&self, left_span: u32, right_span: u32) -> ExtendedRegions {
        let Self { utr5, cds, utr3 } = *self;

        let j5_start = cds.start.saturating_sub(left_span).max(utr5.start);
        let j5_end = cds.start.saturating_add(right_span).saturating_add(1).min(cds.end);
        let cds_end = cds.end.saturating_sub(left_span).max(j5_end);
        let j3_end = cds
            .end
            .saturating_add(right_span)
            .saturating_add(1)
            .min(cds.end.max(utr3.end));

        ExtendedRegions {
            base: *self,
            regions: [
                Interval { start: utr5.start, end: j5_start },
                Interval { start: j5_start, end: j5_end },
                Interval { start: j5_end, end: cds_end },
                Interval { start: cds_end, end: j3_end },
                Interval { start: j3_end, end: utr3.end.max(j3_end) },
            ],
        }
    }
}

/// The five ordered extended regions of a transcript, plus the annotation
/// they were derived from (metagene pivots and clipping use the latter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedRegions {
    pub base: TranscriptRegions,
    regions: [Interval; REGION_COUNT],
}

impl ExtendedRegions {
    #[inline]
    pub fn get(&self, region: Region) -> Interval {
        self.regions[region.column()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, Interval)> + '_ {
        Region::ALL.into_iter().zip(self.regions.iter().copied())
    }

    /// `[UTR5.start, UTR3.end)`: positions a site window may read from.
    pub fn bounds(&self) -> Interval {
        Interval { start: self.base.utr5.start, end: self.base.utr3.end }
    }
}

/// A validated boundary table, one entry per transcript in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    regions: Vec<TranscriptRegions>,
}

impl Annotation {
    /// Only [`crate::annotation::AnnotationBuilder`] and
    /// [`Annotation::from_cut_points`] construct these; both validate.
    pub(crate) fn from_validated(regions: Vec<TranscriptRegions>) -> Self {
        Self { regions }
    }

    /// Rebuild from persisted cut-points and re-check them against the
    /// transcript lengths.
    pub fn from_cut_points(transcripts: &TranscriptSet, cuts: &[[u32; 3]]) -> Result<Self> {
        if cuts.len() != transcripts.len() {
            return Err(RiboError::LayoutMismatch {
                what: "annotation".to_string(),
                expected: transcripts.len(),
                found: cuts.len(),
            });
        }

        let mut problems = Vec::new();
        for (t, cut) in transcripts.iter().zip(cuts) {
            let [utr5_end, cds_end, length] = *cut;
            if length != t.length {
                problems.push(format!(
                    "{} : annotated length {length} differs from transcript length {}",
                    t.name, t.length
                ));
            }
            if utr5_end >= cds_end {
                problems.push(format!("{} : CDS must have positive length", t.name));
            }
            if cds_end > length {
                problems.push(format!("{} : CDS ends past the transcript end", t.name));
            }
        }
        if !problems.is_empty() {
            return Err(RiboError::Annotation { problems });
        }

        Ok(Self {
            regions: cuts.iter().copied().map(TranscriptRegions::from_cut_points).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: TranscriptId) -> &TranscriptRegions {
        &self.regions[id]
    }

    pub fn cut_points(&self) -> Vec<[u32; 3]> {
        self.regions.iter().map(TranscriptRegions::cut_points).collect()
    }

    /// Pair each transcript name with its boundaries.
    pub fn by_transcript<'a>(&self, transcripts: &'a TranscriptSet) -> Result<ByTranscript<'a, TranscriptRegions>> {
        ByTranscript::new(transcripts, self.regions.clone())
    }

    pub fn extended(&self, left_span: u32, right_span: u32) -> ExtendedAnnotation {
        ExtendedAnnotation {
            left_span,
            right_span,
            regions: self.regions.iter().map(|r| r.extend(left_span, right_span)).collect(),
        }
    }
}

/// Extended regions for every transcript, for one (left, right) span pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedAnnotation {
    left_span: u32,
    right_span: u32,
    regions: Vec<ExtendedRegions>,
}

impl ExtendedAnnotation {
    pub fn left_span(&self) -> u32 {
        self.left_span
    }

    pub fn right_span(&self) -> u32 {
        self.right_span
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[inline]
    pub fn get(&self, id: TranscriptId) -> &ExtendedRegions {
        &self.regions[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtendedRegions> {
        self.regions.iter()
    }
}
