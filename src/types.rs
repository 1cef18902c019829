use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiboError};

/// A contiguous interval in transcript coordinates.
/// Coordinates are 0-based, half-open: [start, end). Zero-length intervals are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    /// Create a new interval; `start > end` is an error.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(RiboError::InvalidParameter {
                parameter: "interval".to_string(),
                reason: format!("start {start} is after end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains_pos(self, pos: i64) -> bool {
        pos >= i64::from(self.start) && pos < i64::from(self.end)
    }

    #[inline]
    pub fn range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// The three annotated regions of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseRegion {
    Utr5,
    Cds,
    Utr3,
}

impl BaseRegion {
    pub const ALL: [BaseRegion; 3] = [BaseRegion::Utr5, BaseRegion::Cds, BaseRegion::Utr3];

    pub fn index(self) -> usize {
        match self {
            BaseRegion::Utr5 => 0,
            BaseRegion::Cds => 1,
            BaseRegion::Utr3 => 2,
        }
    }
}

impl FromStr for BaseRegion {
    type Err = String;

    /// Case-insensitive, as annotation BED files mix `UTR5`/`utr5`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UTR5" => Ok(BaseRegion::Utr5),
            "CDS" => Ok(BaseRegion::Cds),
            "UTR3" => Ok(BaseRegion::Utr3),
            _ => Err(format!("'{s}' is not one of UTR5, CDS, UTR3")),
        }
    }
}

impl fmt::Display for BaseRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BaseRegion::Utr5 => "UTR5",
            BaseRegion::Cds => "CDS",
            BaseRegion::Utr3 => "UTR3",
        };
        write!(f, "{s}")
    }
}

/// The five extended regions, in transcript order.
/// The discriminant is the column in region count arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Utr5 = 0,
    Utr5Junction = 1,
    Cds = 2,
    Utr3Junction = 3,
    Utr3 = 4,
}

/// Number of extended regions (width of a region count row).
pub const REGION_COUNT: usize = 5;

impl Region {
    pub const ALL: [Region; REGION_COUNT] = [
        Region::Utr5,
        Region::Utr5Junction,
        Region::Cds,
        Region::Utr3Junction,
        Region::Utr3,
    ];

    #[inline]
    pub fn column(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Utr5 => "UTR5",
            Region::Utr5Junction => "UTR5_junction",
            Region::Cds => "CDS",
            Region::Utr3Junction => "UTR3_junction",
            Region::Utr3 => "UTR3",
        }
    }
}

impl FromStr for Region {
    type Err = RiboError;

    fn from_str(s: &str) -> Result<Self> {
        Region::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| RiboError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!(
                    "'{s}' is not one of {}",
                    Region::ALL.map(Region::name).join(", ")
                ),
            })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Metagene pivot: the first CDS nucleotide or the CDS end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteType {
    Start,
    Stop,
}

impl FromStr for SiteType {
    type Err = RiboError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(SiteType::Start),
            "stop" => Ok(SiteType::Stop),
            _ => Err(RiboError::InvalidParameter {
                parameter: "site_type".to_string(),
                reason: format!("'{s}': site type can be either start or stop"),
            }),
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteType::Start => write!(f, "start"),
            SiteType::Stop => write!(f, "stop"),
        }
    }
}

/// Inclusive read length range `[min, max]`. All array indexing is relative to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadLengthRange {
    min: u32,
    max: u32,
}

impl ReadLengthRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min == 0 {
            return Err(RiboError::InvalidParameter {
                parameter: "length_min".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if min > max {
            return Err(RiboError::InvalidParameter {
                parameter: "length_max".to_string(),
                reason: format!("must be >= length_min ({min}), got {max}"),
            });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(self) -> u32 {
        self.min
    }

    #[inline]
    pub fn max(self) -> u32 {
        self.max
    }

    /// Number of lengths in the range.
    #[inline]
    pub fn count(self) -> usize {
        (self.max - self.min) as usize + 1
    }

    #[inline]
    pub fn contains(self, length: u32) -> bool {
        length >= self.min && length <= self.max
    }

    /// Index of `length` relative to `min`. Caller guarantees `contains(length)`.
    #[inline]
    pub fn relative(self, length: u32) -> usize {
        debug_assert!(self.contains(length));
        (length - self.min) as usize
    }

    pub fn lengths(self) -> impl Iterator<Item = u32> {
        self.min..=self.max
    }

    /// Validate a requested sub-range; `None` means the whole range.
    pub fn sub_range(self, requested: Option<(u32, u32)>) -> Result<ReadLengthRange> {
        let Some((lower, upper)) = requested else {
            return Ok(self);
        };
        let fail = |reason: &str| RiboError::InvalidLengthRange {
            lower,
            upper,
            min: self.min,
            max: self.max,
            reason: reason.to_string(),
        };
        if lower > upper {
            return Err(fail("lower bound exceeds upper bound"));
        }
        if lower < self.min {
            return Err(fail("lower bound is below the minimum read length"));
        }
        if upper > self.max {
            return Err(fail("upper bound is above the maximum read length"));
        }
        Ok(ReadLengthRange { min: lower, max: upper })
    }
}

impl fmt::Display for ReadLengthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
