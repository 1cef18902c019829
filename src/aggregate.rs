//! Read-length range aggregation over flat profile arrays.
//!
//! The same code serves coverage, site windows and region counts; only the
//! [`FlatLayout`] (and so the per-length stride) differs.

use crate::error::Result;
use crate::layout::{FlatLayout, Rows};
use crate::types::ReadLengthRange;

/// How to combine the slices of a length range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateMode {
    /// Add the slices elementwise.
    #[default]
    Sum,
    /// Keep one slice per length.
    Group,
}

impl AggregateMode {
    pub fn summing(sum_lengths: bool) -> Self {
        if sum_lengths {
            AggregateMode::Sum
        } else {
            AggregateMode::Group
        }
    }
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthAggregate {
    Summed(Vec<u64>),
    /// `(absolute read length, slice)` in ascending length order.
    Grouped(Vec<(u32, Vec<u64>)>),
}

impl LengthAggregate {
    /// Collapse to one slice regardless of mode.
    pub fn into_summed(self) -> Vec<u64> {
        match self {
            LengthAggregate::Summed(v) => v,
            LengthAggregate::Grouped(groups) => {
                let mut iter = groups.into_iter().map(|(_, v)| v);
                let mut acc = iter.next().unwrap_or_default();
                for v in iter {
                    add_into(&mut acc, &v);
                }
                acc
            }
        }
    }

    /// Slices tagged with their length; a summed result is tagged `None`.
    pub fn into_slices(self) -> Vec<(Option<u32>, Vec<u64>)> {
        match self {
            LengthAggregate::Summed(v) => vec![(None, v)],
            LengthAggregate::Grouped(groups) => groups.into_iter().map(|(l, v)| (Some(l), v)).collect(),
        }
    }
}

/// Aggregate `data` over the lengths `requested` (`None` means every stored
/// length).
///
/// Fails with [`crate::RiboError::InvalidLengthRange`] when the request is
/// inverted or not inside the stored range, and with
/// [`crate::RiboError::LayoutMismatch`] when `data` does not fit `layout`.
pub fn aggregate(
    data: &[u32],
    layout: &FlatLayout,
    requested: Option<(u32, u32)>,
    mode: AggregateMode,
) -> Result<LengthAggregate> {
    let range = layout.lengths().sub_range(requested)?;
    layout.check("profile array", data.len())?;
    Ok(aggregate_range(data, layout, range, mode))
}

fn aggregate_range(data: &[u32], layout: &FlatLayout, range: ReadLengthRange, mode: AggregateMode) -> LengthAggregate {
    let widen = |len: u32| -> Vec<u64> { data[layout.slice(len)].iter().map(|&v| u64::from(v)).collect() };
    match mode {
        AggregateMode::Sum => {
            let mut acc = vec![0u64; layout.slice_len()];
            for len in range.lengths() {
                add_into_u32(&mut acc, &data[layout.slice(len)]);
            }
            LengthAggregate::Summed(acc)
        }
        AggregateMode::Group => LengthAggregate::Grouped(range.lengths().map(|len| (len, widen(len))).collect()),
    }
}

/// Sum a slice of uniform rows across rows, giving one row.
pub fn sum_rows(slice: &[u64], rows: &Rows) -> Vec<u64> {
    let width = rows.width().unwrap_or(0);
    let mut out = vec![0u64; width];
    for t in 0..rows.count() {
        add_into(&mut out, &slice[rows.row(t)]);
    }
    out
}

fn add_into(acc: &mut [u64], values: &[u64]) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}

fn add_into_u32(acc: &mut [u64], values: &[u32]) {
    for (a, &v) in acc.iter_mut().zip(values) {
        *a += u64::from(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiboError;
    use crate::model::TranscriptSet;
    use rstest::rstest;

    fn fixture() -> (FlatLayout, Vec<u32>) {
        let set = TranscriptSet::new([("A", 3u32), ("B", 2)]).unwrap();
        let lengths = ReadLengthRange::new(20, 23).unwrap();
        let layout = FlatLayout::coverage(lengths, &set);
        let data: Vec<u32> = (0..layout.total_len() as u32).collect();
        (layout, data)
    }

    #[test]
    fn sum_over_a_sub_range() {
        let (layout, data) = fixture();
        let out = aggregate(&data, &layout, Some((21, 22)), AggregateMode::Sum).unwrap();
        // slices 1 and 2: 5..10 and 10..15
        assert_eq!(out, LengthAggregate::Summed(vec![15, 17, 19, 21, 23]));
    }

    #[test]
    fn group_tags_each_length() {
        let (layout, data) = fixture();
        let out = aggregate(&data, &layout, Some((22, 23)), AggregateMode::Group).unwrap();
        let LengthAggregate::Grouped(groups) = out else { panic!() };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], (22, vec![10, 11, 12, 13, 14]));
        assert_eq!(groups[1].0, 23);
    }

    #[test]
    fn range_sum_is_additive() {
        let (layout, data) = fixture();
        let whole = aggregate(&data, &layout, None, AggregateMode::Sum).unwrap().into_summed();
        let mut parts = vec![0u64; layout.slice_len()];
        for k in 20..=23 {
            let one = aggregate(&data, &layout, Some((k, k)), AggregateMode::Sum).unwrap().into_summed();
            add_into(&mut parts, &one);
        }
        assert_eq!(whole, parts);

        let grouped = aggregate(&data, &layout, None, AggregateMode::Group).unwrap().into_summed();
        assert_eq!(whole, grouped);
    }

    #[rstest]
    #[case::coverage(FlatLayout::coverage)]
    #[case::region_counts(FlatLayout::region_counts)]
    #[case::start_windows(|l, t: &TranscriptSet| FlatLayout::site_windows(l, t, 2))]
    fn every_layout_sums_additively(#[case] make: fn(ReadLengthRange, &TranscriptSet) -> FlatLayout) {
        let set = TranscriptSet::new([("A", 3u32), ("B", 2), ("C", 4)]).unwrap();
        let layout = make(ReadLengthRange::new(20, 23).unwrap(), &set);
        let data: Vec<u32> = (0..layout.total_len() as u32).map(|v| v * 7 % 11).collect();

        let middle = aggregate(&data, &layout, Some((21, 23)), AggregateMode::Sum).unwrap().into_summed();
        let mut parts = vec![0u64; layout.slice_len()];
        for k in 21..=23 {
            let one = aggregate(&data, &layout, Some((k, k)), AggregateMode::Sum).unwrap().into_summed();
            add_into(&mut parts, &one);
        }
        assert_eq!(middle, parts);
    }

    #[test]
    fn rejects_bad_ranges_and_sizes() {
        let (layout, data) = fixture();
        for bad in [(22, 21), (19, 21), (21, 24)] {
            assert!(matches!(
                aggregate(&data, &layout, Some(bad), AggregateMode::Sum),
                Err(RiboError::InvalidLengthRange { .. })
            ));
        }
        assert!(matches!(
            aggregate(&data[1..], &layout, None, AggregateMode::Sum),
            Err(RiboError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn sum_rows_collapses_transcripts() {
        let rows = Rows::uniform(3, 2);
        assert_eq!(sum_rows(&[1, 2, 3, 4, 5, 6], &rows), vec![9, 12]);
    }
}
