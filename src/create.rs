//! End-to-end creation of a container from alignment records.

use std::io::BufRead;
use std::path::Path;

use log::info;

use crate::annotation::io::{open_bufread, read_transcript_lengths, AlignmentRecord};
use crate::annotation::{Annotation, AnnotationBuilder};
use crate::config::CreateOptions;
use crate::container::{validate_experiment_name, Container, Experiment};
use crate::error::Result;
use crate::metadata::normalize_metadata;
use crate::model::TranscriptSet;
use crate::profile::ProfileWriter;
use crate::quantify::{quantify_partitions, quantify_records, LengthPartitions, LengthProfile, QuantifyParams};

/// Validate everything that does not depend on the reads, and return an
/// empty container to fill.
fn prepare(experiment: &str, transcripts: TranscriptSet, annotation: Annotation, opts: &CreateOptions) -> Result<Container> {
    let lengths = opts.validate()?;
    validate_experiment_name(experiment)?;
    if let Some(m) = &opts.experiment_metadata {
        normalize_metadata(m)?;
    }
    Container::new(
        &opts.reference_name,
        transcripts,
        annotation,
        lengths,
        opts.radius,
        opts.left_span,
        opts.right_span,
    )?
    .with_metadata(opts.container_metadata.as_deref())
}

fn finish(experiment: &str, container: Container, profiles: Vec<LengthProfile>, opts: &CreateOptions) -> Result<Container> {
    let arrays = ProfileWriter::new(container.transcripts(), container.lengths(), opts.radius)
        .keep_coverage(opts.store_coverage)
        .write(profiles)?;
    let experiment = Experiment::new(experiment, arrays)?.with_metadata(opts.experiment_metadata.as_deref())?;
    info!("experiment {}: {} reads", experiment.name(), experiment.total_reads());
    container.with_experiment(experiment)
}

/// Quantify an alignment BED stream into a new single-experiment container.
///
/// The stream is split into per-length temporary files which are quantified
/// in parallel and removed before returning, on success or failure.
pub fn create_container<R: BufRead>(
    experiment: &str,
    alignments: R,
    transcripts: TranscriptSet,
    annotation: Annotation,
    opts: &CreateOptions,
) -> Result<Container> {
    let container = prepare(experiment, transcripts, annotation, opts)?;
    let extended = container.extended_annotation();
    let params = QuantifyParams::new(container.transcripts(), &extended, opts.radius)?;

    let partitions = LengthPartitions::split(alignments, container.lengths(), opts.tmp_dir.as_deref())?;
    let profiles = quantify_partitions(&partitions, &params, opts.threads)?;
    drop(partitions);

    finish(experiment, container, profiles, opts)
}

/// Like [`create_container`] for records already in memory; no temporary
/// files are involved.
pub fn create_container_from_records(
    experiment: &str,
    records: &[AlignmentRecord],
    transcripts: TranscriptSet,
    annotation: Annotation,
    opts: &CreateOptions,
) -> Result<Container> {
    let container = prepare(experiment, transcripts, annotation, opts)?;
    let extended = container.extended_annotation();
    let params = QuantifyParams::new(container.transcripts(), &extended, opts.radius)?;
    let profiles = quantify_records(records, container.lengths(), &params, opts.threads)?;
    finish(experiment, container, profiles, opts)
}

/// Read the inputs from disk, create the container and save it to `output`.
///
/// The lengths table and annotation are validated before any alignment is
/// read; `output` is only written once everything has succeeded.
pub fn create_file(
    output: &Path,
    experiment: &str,
    lengths_path: &Path,
    annotation_path: &Path,
    alignments_path: &Path,
    opts: &CreateOptions,
) -> Result<Container> {
    opts.validate()?;
    let transcripts = read_transcript_lengths(open_bufread(lengths_path)?)?;
    let annotation = AnnotationBuilder::new(&transcripts).build_from_path(annotation_path)?;
    info!(
        "loaded {} transcripts ({} nt) and their annotation",
        transcripts.len(),
        transcripts.total_length()
    );

    let container = create_container(experiment, open_bufread(alignments_path)?, transcripts, annotation, opts)?;
    container.save(output)?;
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiboError;
    use crate::types::Region;
    use std::io::Cursor;

    fn inputs() -> (TranscriptSet, Annotation) {
        let transcripts = TranscriptSet::new([("T1", 20u32), ("T2", 12)]).unwrap();
        let annotation = Annotation::from_cut_points(&transcripts, &[[6, 15, 20], [0, 9, 12]]).unwrap();
        (transcripts, annotation)
    }

    fn opts() -> CreateOptions {
        CreateOptions::new("toy").lengths(3, 5).radius(2).spans(3, 2).threads(2)
    }

    #[test]
    fn single_read_in_the_cds() {
        let (t, a) = inputs();
        let c = create_container("e1", Cursor::new("T1 10 14 r 0 +\n"), t, a, &opts()).unwrap();
        let e = c.experiment("e1").unwrap();
        assert_eq!(e.total_reads(), 1);

        let table = &c.region_counts(Region::Cds, &[], None, true, false).unwrap()[0];
        assert_eq!(table.row(None, Some(0)).unwrap().values, vec![1]);
        for region in [Region::Utr5, Region::Utr5Junction, Region::Utr3Junction, Region::Utr3] {
            let table = &c.region_counts(region, &[], None, true, true).unwrap()[0];
            assert_eq!(table.rows[0].values, vec![0], "{region}");
        }
    }

    #[test]
    fn streaming_and_in_memory_paths_agree() {
        let bed = "T1 0 3 a 0 +\nT1 6 10 b 0 +\nT2 11 16 c 0 -\nT2 4 8 d 0 +\nT1 1 30 e 0 +\n";
        let (t, a) = inputs();
        let tmp = tempfile::tempdir().unwrap();
        let o = opts().tmp_dir(tmp.path());
        let mut streamed = create_container("e1", Cursor::new(bed), t.clone(), a.clone(), &o).unwrap();

        let records: Vec<AlignmentRecord> = crate::annotation::AlignmentReader::new(Cursor::new(bed))
            .records()
            .collect::<Result<_>>()
            .unwrap();
        let in_memory = create_container_from_records("e1", &records, t, a, &o).unwrap();

        streamed.set_creation_time(in_memory.creation_time());
        assert_eq!(streamed, in_memory);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_run_leaves_no_temporary_files() {
        let (t, a) = inputs();
        let tmp = tempfile::tempdir().unwrap();
        let o = opts().tmp_dir(tmp.path());
        let err = create_container("e1", Cursor::new("T9 0 4 r 0 +\n"), t, a, &o).unwrap_err();
        assert!(matches!(err, RiboError::UnknownTranscript { .. }));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn coverage_retention_is_optional() {
        let (t, a) = inputs();
        let c = create_container("e1", Cursor::new("T1 10 14 r 0 +\n"), t, a, &opts().store_coverage(false)).unwrap();
        assert!(!c.experiment("e1").unwrap().has_coverage());
    }

    #[test]
    fn bad_inputs_fail_before_reading_reads() {
        let (t, a) = inputs();
        assert!(matches!(
            create_container("bad name", Cursor::new(""), t.clone(), a.clone(), &opts()),
            Err(RiboError::InvalidName { .. })
        ));
        assert!(matches!(
            create_container("e1", Cursor::new(""), t, a, &opts().experiment_metadata("[]")),
            Err(RiboError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn create_file_validates_annotation_and_writes_nothing_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let lengths = dir.path().join("lengths.tsv");
        let bed = dir.path().join("annotation.bed");
        let reads = dir.path().join("reads.bed");
        let out = dir.path().join("out.ribo");
        std::fs::write(&lengths, "T1 20\n").unwrap();
        std::fs::write(&bed, "T1 0 6 UTR5 0 +\nT1 6 15 CDS 0 +\n").unwrap();
        std::fs::write(&reads, "T1 10 14 r 0 +\n").unwrap();

        let err = create_file(&out, "e1", &lengths, &bed, &reads, &opts()).unwrap_err();
        assert!(matches!(err, RiboError::Annotation { .. }));
        assert!(!out.exists());

        std::fs::write(&bed, "T1 0 6 UTR5 0 +\nT1 6 15 CDS 0 +\nT1 15 20 UTR3 0 +\n").unwrap();
        let c = create_file(&out, "e1", &lengths, &bed, &reads, &opts()).unwrap();
        assert_eq!(Container::load(&out).unwrap(), c);
    }
}
