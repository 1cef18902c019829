use log::{debug, info};
use rayon::prelude::*;

use crate::annotation::io::AlignmentRecord;
use crate::error::{Result, RiboError};
use crate::quantify::coverage::CoverageBuilder;
use crate::quantify::partition::LengthPartitions;
use crate::quantify::{quantify_coverage, quantify_reader, LengthProfile, QuantifyParams};
use crate::types::ReadLengthRange;

/// Run `job` once per read length on a pool of `threads` workers.
///
/// Jobs may finish in any order; the results are sorted by length before
/// they are returned. The first failing job fails the whole run.
pub fn run_per_length<T, F>(lengths: ReadLengthRange, threads: usize, job: F) -> Result<Vec<(u32, T)>>
where
    T: Send,
    F: Fn(u32) -> Result<T> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| RiboError::InvalidParameter {
            parameter: "threads".to_string(),
            reason: format!("failed to create thread pool: {e}"),
        })?;

    let all: Vec<u32> = lengths.lengths().collect();
    let mut results: Vec<(u32, T)> = pool.install(|| {
        all.into_par_iter()
            .map(|len| job(len).map(|out| (len, out)))
            .collect::<Result<Vec<_>>>()
    })?;

    results.sort_unstable_by_key(|(len, _)| *len);
    Ok(results)
}

/// Quantify every partition file in parallel.
pub fn quantify_partitions(
    partitions: &LengthPartitions,
    params: &QuantifyParams<'_>,
    threads: usize,
) -> Result<Vec<LengthProfile>> {
    info!(
        "quantifying {} read lengths on {} worker(s)",
        partitions.lengths().count(),
        threads.max(1)
    );
    let results = run_per_length(partitions.lengths(), threads, |len| {
        let profile = quantify_reader(len, partitions.open(len)?, params)?;
        debug!("length {len}: quantified {} reads", profile.total_reads());
        Ok(profile)
    })?;
    Ok(results.into_iter().map(|(_, p)| p).collect())
}

/// Quantify in-memory records, grouping them by read length first.
/// Records whose length is outside `lengths` are ignored.
pub fn quantify_records(
    records: &[AlignmentRecord],
    lengths: ReadLengthRange,
    params: &QuantifyParams<'_>,
    threads: usize,
) -> Result<Vec<LengthProfile>> {
    let mut groups: Vec<Vec<&AlignmentRecord>> = vec![Vec::new(); lengths.count()];
    for record in records.iter().filter(|r| lengths.contains(r.read_length)) {
        groups[lengths.relative(record.read_length)].push(record);
    }

    let results = run_per_length(lengths, threads, |len| {
        let mut builder = CoverageBuilder::new(params.transcripts);
        for record in &groups[lengths.relative(len)] {
            builder.add_record(record)?;
        }
        quantify_coverage(len, builder.finish(), params)
    })?;
    Ok(results.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::model::TranscriptSet;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(8)]
    fn results_come_back_in_length_order(#[case] threads: usize) {
        let lengths = ReadLengthRange::new(20, 35).unwrap();
        let out = run_per_length(lengths, threads, |len| Ok(len * 2)).unwrap();
        let got: Vec<u32> = out.iter().map(|(len, _)| *len).collect();
        assert_eq!(got, (20..=35).collect::<Vec<_>>());
        assert!(out.iter().all(|(len, v)| *v == len * 2));
    }

    #[test]
    fn one_failing_length_fails_the_run() {
        let lengths = ReadLengthRange::new(1, 10).unwrap();
        let res = run_per_length(lengths, 4, |len| {
            if len == 7 {
                Err(RiboError::UnknownTranscript { name: "X".into() })
            } else {
                Ok(())
            }
        });
        assert!(matches!(res, Err(RiboError::UnknownTranscript { .. })));
    }

    #[test]
    fn partitions_and_records_agree() {
        let set = TranscriptSet::new([("T1", 20u32), ("T2", 12)]).unwrap();
        let ext = Annotation::from_cut_points(&set, &[[6, 15, 20], [2, 10, 12]])
            .unwrap()
            .extended(3, 2);
        let params = QuantifyParams::new(&set, &ext, 3).unwrap();
        let lengths = ReadLengthRange::new(2, 4).unwrap();

        let bed = "T1 10 12 a 0 +\nT1 6 9 b 0 +\nT2 3 7 c 0 +\nT2 3 7 d 0 +\nT1 0 1 e 0 +\n";
        let tmp = tempfile::tempdir().unwrap();
        let parts = LengthPartitions::split(Cursor::new(bed), lengths, Some(tmp.path())).unwrap();
        let from_files = quantify_partitions(&parts, &params, 2).unwrap();

        let records: Vec<AlignmentRecord> = crate::annotation::AlignmentReader::new(Cursor::new(bed))
            .records()
            .collect::<Result<_>>()
            .unwrap();
        let from_memory = quantify_records(&records, lengths, &params, 2).unwrap();

        assert_eq!(from_files, from_memory);
        assert_eq!(from_files.iter().map(|p| p.read_length).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(from_files.iter().map(LengthProfile::total_reads).collect::<Vec<_>>(), vec![1, 1, 2]);
    }
}
