use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use ribo_profile::{
    create_file, merge_files, AggregateMode, Container, CreateOptions, Region, RiboError, SiteType,
};

struct Inputs {
    dir: TempDir,
    lengths: PathBuf,
    annotation: PathBuf,
}

impl Inputs {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let lengths = dir.path().join("lengths.tsv");
        let annotation = dir.path().join("annotation.bed");
        std::fs::write(&lengths, "# name length\nT1\t20\nT2\t12\n").unwrap();
        std::fs::write(
            &annotation,
            "T1 0 6 UTR5 0 +\nT1 6 15 CDS 0 +\nT1 15 20 UTR3 0 +\n\
             T2 0 2 UTR5 0 +\nT2 2 9 CDS 0 +\nT2 9 12 UTR3 0 +\n",
        )
        .unwrap();
        Self { dir, lengths, annotation }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn reads(&self, name: &str, bed: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bed).unwrap();
        path
    }

    fn gz_reads(&self, name: &str, bed: &str) -> PathBuf {
        let path = self.path(name);
        let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(bed.as_bytes()).unwrap();
        enc.finish().unwrap();
        path
    }

    fn create(&self, out: &Path, experiment: &str, reads: &Path, opts: &CreateOptions) -> Container {
        create_file(out, experiment, &self.lengths, &self.annotation, reads, opts).unwrap()
    }
}

fn opts() -> CreateOptions {
    CreateOptions::new("toy").lengths(3, 5).radius(2).spans(3, 2).threads(2)
}

#[test]
fn create_merge_and_query() {
    let inputs = Inputs::new();
    let a = inputs.path("a.ribo");
    let b = inputs.path("b.ribo");
    let merged_path = inputs.path("merged.ribo");

    let reads_a = inputs.reads("a.bed", "T1 10 14 r1 0 +\nT2 3 8 r2 0 +\n");
    let reads_b = inputs.gz_reads("b.bed.gz", "T1 0 3 r1 0 +\nT1 10 13 r2 0 +\nT1 0 40 long 0 +\n");
    inputs.create(&a, "e1", &reads_a, &opts().container_metadata(r#"{"lab": "a", "x": 1}"#));
    inputs.create(&b, "e2", &reads_b, &opts().container_metadata(r#"{"lab": "b"}"#));

    let merged = merge_files(&merged_path, &[a, b]).unwrap();
    assert_eq!(Container::load(&merged_path).unwrap(), merged);
    assert_eq!(merged.experiment_names().collect::<Vec<_>>(), vec!["e1", "e2"]);
    assert_eq!(merged.experiment("e1").unwrap().total_reads(), 2);
    assert_eq!(merged.experiment("e2").unwrap().total_reads(), 2);

    let meta: serde_json::Value = serde_json::from_str(merged.metadata().unwrap()).unwrap();
    assert_eq!(meta["lab"], "b");
    assert_eq!(meta["x"], 1);

    let cds = merged.region_counts(Region::Cds, &[], None, true, true).unwrap();
    assert_eq!(cds.len(), 2);
    assert!(cds.iter().all(|t| t.rows[0].values == vec![1]));

    let utr5 = merged.region_counts(Region::Utr5, &["e2"], None, true, true).unwrap();
    assert_eq!(utr5[0].rows[0].values, vec![1]);

    let dist = merged.length_distribution(Region::Cds, &["e1", "e2"]).unwrap();
    assert_eq!(dist[0].rows.iter().map(|r| r.values[0]).collect::<Vec<_>>(), vec![0, 1, 0]);
    assert_eq!(dist[1].rows.iter().map(|r| r.values[0]).collect::<Vec<_>>(), vec![1, 0, 0]);

    let cov = merged.coverage("e1", None, AggregateMode::Sum).unwrap().into_summed();
    assert_eq!(cov.len(), 32);
    assert_eq!(cov.iter().sum::<u64>(), 2);
    assert_eq!((cov[10], cov[23]), (1, 1));

    let start = merged.metagene(SiteType::Start, &[], Some((3, 4)), true, true).unwrap();
    assert!(start.iter().all(|t| t.rows.len() == 1 && t.rows[0].values.len() == 5));
}

#[test]
fn incompatible_inputs_are_rejected_before_writing() {
    let inputs = Inputs::new();
    let a = inputs.path("a.ribo");
    let b = inputs.path("b.ribo");
    let out = inputs.path("merged.ribo");
    let reads = inputs.reads("reads.bed", "T1 10 14 r1 0 +\n");

    inputs.create(&a, "e1", &reads, &opts());
    inputs.create(&b, "e2", &reads, &opts().radius(3));

    let err = merge_files(&out, &[a.clone(), b]).unwrap_err();
    assert!(matches!(err, RiboError::IncompatibleContainer { .. }));
    assert!(!out.exists());

    let err = merge_files(&out, &[a.clone(), a]).unwrap_err();
    assert!(matches!(err, RiboError::IncompatibleContainer { .. }));
    assert!(!out.exists());
}

#[test]
fn rnaseq_values_survive_save_and_merge() {
    let inputs = Inputs::new();
    let a = inputs.path("a.ribo");
    let b = inputs.path("b.ribo");
    let reads = inputs.reads("reads.bed", "T1 10 14 r1 0 +\n");

    let c = inputs.create(&a, "e1", &reads, &opts());
    let table: Vec<f32> = (0..10).map(|v| v as f32 * 0.5).collect();
    c.with_rnaseq("e1", table).unwrap().save(&a).unwrap();
    inputs.create(&b, "e2", &reads, &opts().store_coverage(false));

    let merged = merge_files(&inputs.path("m.ribo"), &[a, b]).unwrap();
    let rnaseq = merged.rnaseq("e1").unwrap().unwrap();
    assert_eq!(rnaseq.get("T2").unwrap(), &[2.5, 3.0, 3.5, 4.0, 4.5]);
    assert!(merged.rnaseq("e2").unwrap().is_none());
    assert!(matches!(
        merged.coverage("e2", None, AggregateMode::Sum),
        Err(RiboError::CoverageNotStored { .. })
    ));
}
