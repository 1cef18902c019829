//! Read-side queries. All of them are pure functions of the container.

use crate::aggregate::{aggregate, sum_rows, AggregateMode, LengthAggregate};
use crate::annotation::TranscriptRegions;
use crate::container::{Container, Experiment};
use crate::error::{Result, RiboError};
use crate::layout::FlatLayout;
use crate::model::{ByTranscript, ExperimentTable, TableRow, TranscriptNaming};
use crate::types::{Region, SiteType, REGION_COUNT};

impl Container {
    /// The experiments a query runs over: every experiment (in name order)
    /// when `names` is empty, otherwise exactly `names`.
    fn select<'c>(&'c self, names: &[&str]) -> Result<Vec<&'c Experiment>> {
        if names.is_empty() {
            return Ok(self.experiments().collect());
        }
        names.iter().map(|n| self.experiment(n)).collect()
    }

    fn stored_coverage<'c>(&'c self, experiment: &str) -> Result<&'c [u32]> {
        self.experiment(experiment)?
            .coverage()
            .ok_or_else(|| RiboError::CoverageNotStored { experiment: experiment.to_string() })
    }

    /// Nucleotide coverage of every transcript, concatenated in transcript
    /// order, for the read lengths in `range` (`None`: all).
    pub fn coverage(&self, experiment: &str, range: Option<(u32, u32)>, mode: AggregateMode) -> Result<LengthAggregate> {
        let cov = self.stored_coverage(experiment)?;
        aggregate(cov, &self.coverage_layout(), range, mode)
    }

    /// Nucleotide coverage of one transcript, given by name or alias.
    pub fn transcript_coverage(
        &self,
        experiment: &str,
        transcript: &str,
        range: Option<(u32, u32)>,
        mode: AggregateMode,
    ) -> Result<LengthAggregate> {
        let id = self.resolve_transcript(transcript)?;
        let span = self.transcripts().span(id);
        Ok(match self.coverage(experiment, range, mode)? {
            LengthAggregate::Summed(v) => LengthAggregate::Summed(v[span].to_vec()),
            LengthAggregate::Grouped(groups) => LengthAggregate::Grouped(
                groups.into_iter().map(|(len, v)| (len, v[span.clone()].to_vec())).collect(),
            ),
        })
    }

    /// Start or stop site windows.
    ///
    /// Each row holds `2 * radius + 1` values. Rows are per transcript unless
    /// `sum_references`, and per read length unless `sum_lengths`.
    pub fn metagene(
        &self,
        site: SiteType,
        experiments: &[&str],
        range: Option<(u32, u32)>,
        sum_lengths: bool,
        sum_references: bool,
    ) -> Result<Vec<ExperimentTable>> {
        let layout = self.site_layout();
        self.select(experiments)?
            .into_iter()
            .map(|e| {
                let data = match site {
                    SiteType::Start => e.start_sites(),
                    SiteType::Stop => e.stop_sites(),
                };
                let agg = aggregate(data, &layout, range, AggregateMode::summing(sum_lengths))?;
                Ok(self.tabulate(e.name(), agg, &layout, sum_references, |row| row.to_vec()))
            })
            .collect()
    }

    /// Counts of one extended region, one value per row.
    ///
    /// Rows are per transcript unless `sum_references`, and per read length
    /// unless `sum_lengths`.
    pub fn region_counts(
        &self,
        region: Region,
        experiments: &[&str],
        range: Option<(u32, u32)>,
        sum_lengths: bool,
        sum_references: bool,
    ) -> Result<Vec<ExperimentTable>> {
        let layout = self.region_layout();
        let column = region.column();
        self.select(experiments)?
            .into_iter()
            .map(|e| {
                let agg = aggregate(e.region_counts(), &layout, range, AggregateMode::summing(sum_lengths))?;
                Ok(self.tabulate(e.name(), agg, &layout, sum_references, |row| vec![row[column]]))
            })
            .collect()
    }

    /// Per-length totals of one region over all transcripts, for the whole
    /// stored length range.
    pub fn length_distribution(&self, region: Region, experiments: &[&str]) -> Result<Vec<ExperimentTable>> {
        self.region_counts(region, experiments, None, false, true)
    }

    /// The RNA-seq table of an experiment, if one is attached.
    pub fn rnaseq(&self, experiment: &str) -> Result<Option<ByTranscript<'_, [f32; REGION_COUNT]>>> {
        let Some(table) = self.experiment(experiment)?.rnaseq() else {
            return Ok(None);
        };
        let rows = table
            .chunks_exact(REGION_COUNT)
            .map(|c| [c[0], c[1], c[2], c[3], c[4]])
            .collect();
        ByTranscript::new(self.transcripts(), rows).map(Some)
    }

    /// The RNA-seq values of one transcript, given by name or alias.
    pub fn transcript_rnaseq(&self, experiment: &str, transcript: &str) -> Result<Option<[f32; REGION_COUNT]>> {
        let id = self.resolve_transcript(transcript)?;
        Ok(self.rnaseq(experiment)?.map(|table| *table.by_id(id)))
    }

    /// The rows of a per-transcript query table that belong to one transcript,
    /// given by name or alias.
    pub fn rows_of<'t>(&self, table: &'t ExperimentTable, transcript: &str) -> Result<Vec<&'t TableRow>> {
        let id = self.resolve_transcript(transcript)?;
        Ok(table.rows.iter().filter(|r| r.transcript == Some(id)).collect())
    }

    /// RNA-seq values labelled by transcript name or alias, in transcript order.
    pub fn labelled_rnaseq(
        &self,
        experiment: &str,
        naming: TranscriptNaming,
    ) -> Result<Option<Vec<(&str, [f32; REGION_COUNT])>>> {
        let labels = self.transcript_labels(naming)?;
        Ok(self
            .rnaseq(experiment)?
            .map(|table| labels.into_iter().zip(table.into_rows()).collect()))
    }

    /// Annotation boundaries keyed by transcript.
    pub fn boundaries(&self) -> Result<ByTranscript<'_, TranscriptRegions>> {
        self.annotation().by_transcript(self.transcripts())
    }

    /// Turn aggregated uniform-row slices into table rows, projecting each
    /// (possibly summed) row through `project`.
    fn tabulate(
        &self,
        experiment: &str,
        agg: LengthAggregate,
        layout: &FlatLayout,
        sum_references: bool,
        project: impl Fn(&[u64]) -> Vec<u64>,
    ) -> ExperimentTable {
        let rows_geom = layout.rows();
        let mut rows = Vec::new();
        for (read_length, slice) in agg.into_slices() {
            if sum_references {
                rows.push(TableRow { read_length, transcript: None, values: project(&sum_rows(&slice, rows_geom)) });
            } else {
                rows.extend((0..rows_geom.count()).map(|t| TableRow {
                    read_length,
                    transcript: Some(t),
                    values: project(&slice[rows_geom.row(t)]),
                }));
            }
        }
        ExperimentTable { experiment: experiment.to_string(), rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::tests::small_container;
    use crate::model::{ReferenceAlias, TranscriptSet};

    #[test]
    fn empty_selection_means_all_experiments() {
        let c = small_container("e1");
        let tables = c.region_counts(Region::Cds, &[], None, true, true).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].experiment, "e1");
        assert!(matches!(
            c.region_counts(Region::Cds, &["nope"], None, true, true),
            Err(RiboError::ExperimentNotFound { .. })
        ));
    }

    #[test]
    fn region_counts_pick_one_column() {
        let c = small_container("e1");
        let e = c.experiment("e1").unwrap();
        let table = &c.region_counts(Region::Utr3Junction, &["e1"], Some((29, 29)), false, false).unwrap()[0];
        // length 29 is the second slice of 2 x 5 values
        let slice = &e.region_counts()[10..20];
        assert_eq!(table.row(Some(29), Some(0)).unwrap().values, vec![u64::from(slice[3])]);
        assert_eq!(table.row(Some(29), Some(1)).unwrap().values, vec![u64::from(slice[8])]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn summing_lengths_and_references_gives_one_row() {
        let c = small_container("e1");
        let e = c.experiment("e1").unwrap();
        let table = &c.metagene(SiteType::Start, &[], None, true, true).unwrap()[0];
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!((row.read_length, row.transcript), (None, None));
        let width = 5;
        let expected: Vec<u64> = (0..width)
            .map(|i| e.start_sites().iter().skip(i).step_by(width).map(|&v| u64::from(v)).sum())
            .collect();
        assert_eq!(row.values, expected);
    }

    #[test]
    fn metagene_range_is_additive() {
        let c = small_container("e1");
        let whole = &c.metagene(SiteType::Stop, &[], None, true, false).unwrap()[0];
        let per_length = &c.metagene(SiteType::Stop, &[], None, false, false).unwrap()[0];
        for t in 0..2 {
            let a = &whole.row(None, Some(t)).unwrap().values;
            let b: Vec<u64> = (0..5)
                .map(|i| {
                    per_length.row(Some(28), Some(t)).unwrap().values[i]
                        + per_length.row(Some(29), Some(t)).unwrap().values[i]
                })
                .collect();
            assert_eq!(a, &b);
        }
    }

    #[test]
    fn length_distribution_has_one_row_per_length() {
        let c = small_container("e1");
        let table = &c.length_distribution(Region::Cds, &[]).unwrap()[0];
        let lengths: Vec<_> = table.rows.iter().map(|r| r.read_length).collect();
        assert_eq!(lengths, vec![Some(28), Some(29)]);
    }

    #[test]
    fn transcript_coverage_slices_one_transcript() {
        let c = small_container("e1");
        let cov = c.experiment("e1").unwrap().coverage().unwrap().to_vec();
        let LengthAggregate::Grouped(groups) =
            c.transcript_coverage("e1", "T2", Some((29, 29)), AggregateMode::Group).unwrap()
        else {
            panic!()
        };
        // slice 29 starts at 30; T2 is nucleotides 20..30 of it
        let expected: Vec<u64> = cov[50..60].iter().map(|&v| u64::from(v)).collect();
        assert_eq!(groups, vec![(29, expected)]);
        assert!(matches!(
            c.transcript_coverage("e1", "T9", None, AggregateMode::Sum),
            Err(RiboError::UnknownTranscript { .. })
        ));
    }

    #[test]
    fn coverage_requires_retention() {
        let c = small_container("e1");
        let e = c.experiment("e1").unwrap();
        let arrays = crate::profile::ProfileArrays {
            total_reads: 0,
            start_sites: e.start_sites().to_vec(),
            stop_sites: e.stop_sites().to_vec(),
            region_counts: e.region_counts().to_vec(),
            coverage: None,
        };
        let c = c.with_experiment(Experiment::new("e2", arrays).unwrap()).unwrap();
        assert!(matches!(
            c.coverage("e2", None, AggregateMode::Sum),
            Err(RiboError::CoverageNotStored { .. })
        ));
        assert!(matches!(
            c.coverage("e1", Some((27, 29)), AggregateMode::Sum),
            Err(RiboError::InvalidLengthRange { .. })
        ));
    }

    fn aliased(c: Container) -> Container {
        let alias = ReferenceAlias::new(c.transcripts(), |name| Some(format!("{name}-201"))).unwrap();
        c.with_alias(alias).unwrap()
    }

    #[test]
    fn queries_resolve_aliases() {
        let c = aliased(small_container("e1"));
        let by_name = c.transcript_coverage("e1", "T2", None, AggregateMode::Sum).unwrap();
        let by_alias = c.transcript_coverage("e1", "T2-201", None, AggregateMode::Sum).unwrap();
        assert_eq!(by_name, by_alias);

        let table = &c.region_counts(Region::Cds, &["e1"], Some((28, 28)), false, false).unwrap()[0];
        let rows = c.rows_of(table, "T1-201").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transcript, Some(0));

        let labels = c.transcript_labels(TranscriptNaming::Alias).unwrap();
        let named: Vec<_> = table.labelled_rows(&labels).map(|(_, t, _)| t).collect();
        assert_eq!(named, vec![Some("T1-201"), Some("T2-201")]);

        let c = c.with_rnaseq("e1", (0..10).map(|v| v as f32).collect()).unwrap();
        assert_eq!(c.transcript_rnaseq("e1", "T2-201").unwrap(), Some([5.0, 6.0, 7.0, 8.0, 9.0]));
        let labelled = c.labelled_rnaseq("e1", TranscriptNaming::Alias).unwrap().unwrap();
        assert_eq!(labelled[0].0, "T1-201");
    }

    #[test]
    fn aliases_are_optional_and_checked() {
        let c = small_container("e1");
        assert!(matches!(
            c.transcript_coverage("e1", "T2-201", None, AggregateMode::Sum),
            Err(RiboError::UnknownTranscript { .. })
        ));
        assert!(matches!(c.transcript_labels(TranscriptNaming::Alias), Err(RiboError::Alias { .. })));

        let other = TranscriptSet::new([("X", 5u32)]).unwrap();
        let foreign = ReferenceAlias::new(&other, |n| Some(n.to_lowercase())).unwrap();
        assert!(matches!(c.clone().with_alias(foreign), Err(RiboError::Alias { .. })));

        let clash = ReferenceAlias::new(c.transcripts(), |_| Some("same".to_string()));
        assert!(matches!(clash, Err(RiboError::Alias { .. })));

        let c = aliased(c);
        assert!(matches!(
            c.transcript_coverage("e1", "T9-201", None, AggregateMode::Sum),
            Err(RiboError::Alias { .. })
        ));
    }

    #[test]
    fn rnaseq_table_is_keyed_by_transcript() {
        let c = small_container("e1");
        assert!(c.rnaseq("e1").unwrap().is_none());
        let c = c.with_rnaseq("e1", (0..10).map(|v| v as f32).collect()).unwrap();
        let table = c.rnaseq("e1").unwrap().unwrap();
        assert_eq!(table.get("T2").unwrap(), &[5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(c.boundaries().unwrap().get("T1").unwrap().cds.start, 6);
    }
}
