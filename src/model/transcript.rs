use std::collections::HashMap;

use crate::error::{Result, RiboError};
use crate::model::types::TranscriptId;

/// One reference transcript: a unique name, a positive length and a fixed
/// position in the file-wide order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: TranscriptId,
    pub name: String,
    pub length: u32,
}

/// The ordered transcript table.
///
/// Every per-transcript array in a profile is laid out in this order, and all
/// views over such arrays borrow the set they were built from. Nucleotide
/// offsets are computed once here so that coverage slicing never has to
/// re-derive them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSet {
    transcripts: Vec<Transcript>,
    by_name: HashMap<String, TranscriptId>,
    // offsets[i]..offsets[i + 1] is transcript i in a concatenated coverage slice
    offsets: Vec<usize>,
}

impl TranscriptSet {
    /// Build the table from `(name, length)` pairs in file order.
    ///
    /// Rejects empty input, duplicate names, empty names and zero lengths,
    /// reporting all of them at once.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut transcripts = Vec::new();
        let mut by_name = HashMap::new();
        let mut offsets = vec![0usize];
        let mut problems = Vec::new();

        for (name, length) in entries {
            let name: String = name.into();
            let id = transcripts.len();
            if name.is_empty() {
                problems.push(format!("transcript #{id} has an empty name"));
            }
            if length == 0 {
                problems.push(format!("{name} : length must be positive"));
            }
            if by_name.insert(name.clone(), id).is_some() {
                problems.push(format!("{name} : appears more than once"));
            }
            offsets.push(offsets[id] + length as usize);
            transcripts.push(Transcript { id, name, length });
        }

        if transcripts.is_empty() {
            problems.push("the transcript table is empty".to_string());
        }
        if !problems.is_empty() {
            return Err(RiboError::InvalidParameter {
                parameter: "reference_lengths".to_string(),
                reason: problems.join("; "),
            });
        }

        Ok(Self { transcripts, by_name, offsets })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn get(&self, id: TranscriptId) -> Option<&Transcript> {
        self.transcripts.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.iter()
    }

    /// Look up a transcript by name; unknown names are an error.
    pub fn id_of(&self, name: &str) -> Result<TranscriptId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RiboError::UnknownTranscript { name: name.to_string() })
    }

    pub fn name(&self, id: TranscriptId) -> &str {
        &self.transcripts[id].name
    }

    pub fn length(&self, id: TranscriptId) -> u32 {
        self.transcripts[id].length
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transcripts.iter().map(|t| t.name.as_str())
    }

    pub fn lengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.transcripts.iter().map(|t| t.length)
    }

    /// First nucleotide of transcript `id` in a concatenated coverage slice.
    #[inline]
    pub fn offset(&self, id: TranscriptId) -> usize {
        self.offsets[id]
    }

    /// Range of transcript `id` in a concatenated coverage slice.
    #[inline]
    pub fn span(&self, id: TranscriptId) -> std::ops::Range<usize> {
        self.offsets[id]..self.offsets[id + 1]
    }

    /// Sum of all transcript lengths.
    #[inline]
    pub fn total_length(&self) -> usize {
        self.offsets[self.transcripts.len()]
    }
}

/// Per-transcript rows coupled to the transcript order they were built in.
#[derive(Debug, Clone, PartialEq)]
pub struct ByTranscript<'a, T> {
    transcripts: &'a TranscriptSet,
    rows: Vec<T>,
}

impl<'a, T> ByTranscript<'a, T> {
    pub fn new(transcripts: &'a TranscriptSet, rows: Vec<T>) -> Result<Self> {
        if rows.len() != transcripts.len() {
            return Err(RiboError::LayoutMismatch {
                what: "per-transcript rows".to_string(),
                expected: transcripts.len(),
                found: rows.len(),
            });
        }
        Ok(Self { transcripts, rows })
    }

    pub fn transcripts(&self) -> &'a TranscriptSet {
        self.transcripts
    }

    pub fn get(&self, name: &str) -> Result<&T> {
        let id = self.transcripts.id_of(name)?;
        Ok(&self.rows[id])
    }

    pub fn by_id(&self, id: TranscriptId) -> &T {
        &self.rows[id]
    }

    /// `(transcript name, row)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.transcripts.names().zip(self.rows.iter())
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}
