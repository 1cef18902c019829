use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::TempDir;

use crate::annotation::io::{content_lines, parse_alignment_line};
use crate::error::{Result, RiboError};
use crate::types::ReadLengthRange;

/// Alignment records split into one temporary file per read length.
///
/// The files live in a private temporary directory that is removed when this
/// value is dropped, whether quantification succeeded or not.
#[derive(Debug)]
pub struct LengthPartitions {
    dir: TempDir,
    lengths: ReadLengthRange,
    paths: Vec<PathBuf>,
    counts: Vec<u64>,
    out_of_range: u64,
}

impl LengthPartitions {
    /// Stream `reader` once, appending each record to the file of its read
    /// length. Records outside `lengths` are dropped, short lines are skipped
    /// and malformed lines are skipped with a warning.
    ///
    /// `parent` selects where the temporary directory is created; `None`
    /// uses the system default.
    pub fn split<R: BufRead>(reader: R, lengths: ReadLengthRange, parent: Option<&Path>) -> Result<Self> {
        let dir = match parent {
            Some(p) => tempfile::Builder::new().prefix("ribo-partitions").tempdir_in(p)?,
            None => tempfile::Builder::new().prefix("ribo-partitions").tempdir()?,
        };

        let paths: Vec<PathBuf> = lengths
            .lengths()
            .map(|len| dir.path().join(format!("len_{len}.bed")))
            .collect();
        let mut writers = paths
            .iter()
            .map(|p| File::create(p).map(BufWriter::new))
            .collect::<std::io::Result<Vec<_>>>()?;
        let mut counts = vec![0u64; lengths.count()];
        let mut out_of_range = 0u64;

        for item in content_lines(reader) {
            let (line_no, line) = item?;
            let record = match parse_alignment_line(&line) {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                Err(RiboError::MalformedRecord { line }) => {
                    warn!("skipping malformed alignment record at line {line_no}: {line}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !lengths.contains(record.read_length) {
                out_of_range += 1;
                continue;
            }
            let rel = lengths.relative(record.read_length);
            writeln!(writers[rel], "{line}")?;
            counts[rel] += 1;
        }
        for w in &mut writers {
            w.flush()?;
        }

        let kept: u64 = counts.iter().sum();
        info!(
            "partitioned {kept} alignments into {} read lengths {lengths}, {out_of_range} outside the range",
            lengths.count()
        );
        for (len, n) in lengths.lengths().zip(&counts) {
            debug!("length {len}: {n} alignments");
        }

        Ok(Self { dir, lengths, paths, counts, out_of_range })
    }

    pub fn lengths(&self) -> ReadLengthRange {
        self.lengths
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Partition file of `length`. Callers pass a length inside the range.
    pub fn path(&self, length: u32) -> &Path {
        &self.paths[self.lengths.relative(length)]
    }

    pub fn count(&self, length: u32) -> u64 {
        self.counts[self.lengths.relative(length)]
    }

    /// Number of records dropped because their length was outside the range.
    pub fn out_of_range(&self) -> u64 {
        self.out_of_range
    }

    /// Open the partition of `length` for reading.
    pub fn open(&self, length: u32) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(self.path(length))?))
    }
}
