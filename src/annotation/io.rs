use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use log::warn;

use crate::error::{Result, RiboError};
use crate::model::TranscriptSet;

/// Open a text input, decompressing on the fly when the name ends in `.gz`.
pub fn open_bufread(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let is_gz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let f = File::open(path).map_err(|e| {
        std::io::Error::new(e.kind(), format!("open {}: {e}", path.display()))
    })?;
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Iterate over the non-blank, non-`#` lines of a reader, without line endings.
pub(crate) fn content_lines<R: BufRead>(mut reader: R) -> impl Iterator<Item = Result<(usize, String)>> {
    let mut buf = String::new();
    let mut line_no = 0usize;
    std::iter::from_fn(move || loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => return None,
            Ok(_) => line_no += 1,
            Err(e) => return Some(Err(RiboError::Io(e))),
        }
        let line = buf.trim_end_matches(&['\n', '\r'][..]);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        return Some(Ok((line_no, line.to_string())));
    })
}

pub(crate) fn malformed(line_no: usize, line: &str, problem: &str) -> RiboError {
    RiboError::MalformedRecord { line: format!("line {line_no}: {problem}: '{line}'") }
}

/// Read a `name length` table (whitespace separated) in file order.
pub fn read_transcript_lengths<R: BufRead>(reader: R) -> Result<TranscriptSet> {
    let mut entries = Vec::new();
    for item in content_lines(reader) {
        let (line_no, line) = item?;
        let mut fields = line.split_whitespace();
        let (Some(name), Some(length), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed(line_no, &line, "expected 'name length'"));
        };
        let length: u32 = length
            .parse()
            .map_err(|_| malformed(line_no, &line, "length is not a non-negative integer"))?;
        entries.push((name.to_string(), length));
    }
    TranscriptSet::new(entries)
}

/// One line of an annotation BED file: `name start end REGION score strand`.
///
/// The region label is kept verbatim so the builder can report unknown labels
/// together with every other annotation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub line_no: usize,
    pub transcript: String,
    pub start: u32,
    pub end: u32,
    pub region: String,
}

/// Streaming reader for annotation BED files.
///
/// Blank lines and `#` comments are skipped. A line with fewer than six
/// columns or non-numeric coordinates is returned as
/// [`RiboError::MalformedRecord`]; I/O failures end the stream with
/// [`RiboError::Io`].
pub struct AnnotationReader<R: BufRead> {
    reader: R,
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn records(self) -> impl Iterator<Item = Result<AnnotationRecord>> {
        content_lines(self.reader).map(|item| {
            let (line_no, line) = item?;
            parse_annotation_line(line_no, &line)
        })
    }
}

fn parse_annotation_line(line_no: usize, line: &str) -> Result<AnnotationRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(malformed(line_no, line, "expected at least 6 columns"));
    }
    let start = fields[1]
        .parse()
        .map_err(|_| malformed(line_no, line, "bad start coordinate"))?;
    let end = fields[2]
        .parse()
        .map_err(|_| malformed(line_no, line, "bad end coordinate"))?;
    Ok(AnnotationRecord {
        line_no,
        transcript: fields[0].to_string(),
        start,
        end,
        region: fields[3].to_string(),
    })
}

/// A transcript-local alignment: where its 5' end fell and how long it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub reference: String,
    pub five_prime: u32,
    pub read_length: u32,
}

/// Parse one alignment BED line.
///
/// Returns `Ok(None)` for lines with fewer than six columns; those are
/// skipped without comment. Unparsable coordinates, or an end before the
/// start, are [`RiboError::MalformedRecord`].
pub fn parse_alignment_line(line: &str) -> Result<Option<AlignmentRecord>> {
    let mut fields = line.split_whitespace();
    let (Some(reference), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next()) else {
        return Ok(None);
    };
    if fields.take(3).count() < 3 {
        return Ok(None);
    }

    let bad = || RiboError::MalformedRecord { line: line.to_string() };
    let start: u32 = start.parse().map_err(|_| bad())?;
    let end: u32 = end.parse().map_err(|_| bad())?;
    if end < start {
        return Err(bad());
    }
    Ok(Some(AlignmentRecord {
        reference: reference.to_string(),
        five_prime: start,
        read_length: end - start,
    }))
}

/// Streaming reader for alignment BED files.
///
/// Short lines are dropped silently, malformed ones with a warning; only I/O
/// failures surface as errors.
pub struct AlignmentReader<R: BufRead> {
    reader: R,
}

impl<R: BufRead> AlignmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn records(self) -> impl Iterator<Item = Result<AlignmentRecord>> {
        content_lines(self.reader).filter_map(|item| match item {
            Err(e) => Some(Err(e)),
            Ok((line_no, line)) => match parse_alignment_line(&line) {
                Ok(record) => record.map(Ok),
                Err(RiboError::MalformedRecord { line }) => {
                    warn!("skipping malformed alignment record at line {line_no}: {line}");
                    None
                }
                Err(e) => Some(Err(e)),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn lengths_table_keeps_file_order() {
        let data = "# name length\nT2\t30\n\nT1 20\n";
        let set = read_transcript_lengths(Cursor::new(data)).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["T2", "T1"]);
        assert_eq!(set.lengths().collect::<Vec<_>>(), vec![30, 20]);
    }

    #[test]
    fn lengths_table_rejects_bad_lines() {
        assert!(matches!(
            read_transcript_lengths(Cursor::new("T1 twenty\n")),
            Err(RiboError::MalformedRecord { .. })
        ));
        assert!(read_transcript_lengths(Cursor::new("T1 20 extra\n")).is_err());
    }

    #[test]
    fn annotation_reader_parses_and_flags_short_lines() {
        let data = "\
#comment
T1\t0\t6\tUTR5\t0\t+
T1\t6\t15\tcds\t0\t+
T1\t15
";
        let recs: Vec<_> = AnnotationReader::new(Cursor::new(data)).records().collect();
        assert_eq!(recs.len(), 3);
        let first = recs[0].as_ref().unwrap();
        assert_eq!((first.start, first.end, first.region.as_str()), (0, 6, "UTR5"));
        assert_eq!(first.line_no, 2);
        assert_eq!(recs[1].as_ref().unwrap().region, "cds");
        assert!(matches!(recs[2], Err(RiboError::MalformedRecord { .. })));
    }

    #[test]
    fn alignment_line_uses_start_as_five_prime_end() {
        let rec = parse_alignment_line("GAPDH\t10\t38\tread1\t0\t+").unwrap().unwrap();
        assert_eq!(rec.reference, "GAPDH");
        assert_eq!(rec.five_prime, 10);
        assert_eq!(rec.read_length, 28);

        assert_eq!(parse_alignment_line("GAPDH\t10\t38\tread1\t0").unwrap(), None);
        assert!(parse_alignment_line("GAPDH\tten\t38\tr\t0\t+").is_err());
        assert!(parse_alignment_line("GAPDH\t40\t38\tr\t0\t+").is_err());
    }

    #[test]
    fn alignment_reader_skips_short_and_malformed_lines() {
        let data = "T1 1 29 r 0 +\nT1 2 30\nT1 x 30 r 0 +\nT2 5 33 r 0 -\n";
        let recs: Vec<_> = AlignmentReader::new(Cursor::new(data))
            .records()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].reference, "T2");
    }

    #[test]
    fn open_bufread_handles_gzip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lengths.txt.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(b"T1 20\nT2 5\n").unwrap();
        enc.finish().unwrap();

        let set = read_transcript_lengths(open_bufread(&path).unwrap()).unwrap();
        assert_eq!(set.total_length(), 25);
    }
}
