pub mod alias;
pub mod types;
pub mod transcript;

pub use alias::{apris_human_alias, ReferenceAlias};
pub use types::{ExperimentTable, TableRow, TranscriptId, TranscriptNaming};
pub use transcript::{ByTranscript, Transcript, TranscriptSet};
