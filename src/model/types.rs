/// Internal numeric IDs (indexes into the transcript order).
pub type TranscriptId = usize;

/// How transcripts are labelled in query output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptNaming {
    /// The names of the transcript table
    #[default]
    Name,
    /// The container's alias table
    Alias,
}

/// One row of an aggregated query result.
///
/// Which index levels are present depends on the aggregation:
/// - `read_length` is `None` when values were summed across read lengths
/// - `transcript` is `None` when values were summed across transcripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub read_length: Option<u32>,
    pub transcript: Option<TranscriptId>,
    pub values: Vec<u64>,
}

/// Query result for one experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentTable {
    pub experiment: String,
    pub rows: Vec<TableRow>,
}

impl ExperimentTable {
    /// Row for a given (length, transcript) index pair, if present.
    pub fn row(&self, read_length: Option<u32>, transcript: Option<TranscriptId>) -> Option<&TableRow> {
        self.rows
            .iter()
            .find(|r| r.read_length == read_length && r.transcript == transcript)
    }

    /// `(read_length, transcript label, values)` per row, with labels taken
    /// from `labels` (as returned by `Container::transcript_labels`).
    pub fn labelled_rows<'t>(
        &'t self,
        labels: &'t [&'t str],
    ) -> impl Iterator<Item = (Option<u32>, Option<&'t str>, &'t [u64])> + 't {
        self.rows
            .iter()
            .map(move |r| (r.read_length, r.transcript.map(|t| labels[t]), r.values.as_slice()))
    }

    /// Elementwise total over all rows.
    pub fn total(&self) -> Vec<u64> {
        let width = self.rows.first().map_or(0, |r| r.values.len());
        let mut out = vec![0u64; width];
        for row in &self.rows {
            for (acc, v) in out.iter_mut().zip(&row.values) {
                *acc += v;
            }
        }
        out
    }
}
