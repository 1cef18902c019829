//! Error types for profile creation, storage, queries and merging.

use thiserror::Error;

/// Result type alias for ribo_profile operations
pub type Result<T> = std::result::Result<T, RiboError>;

/// Error type for ribo_profile operations
#[derive(Error, Debug)]
pub enum RiboError {
    /// Structural annotation problems. Every offending transcript is listed.
    #[error("Annotation error:\n{}", .problems.join("\n"))]
    Annotation {
        /// One line per problem, prefixed with the transcript (or line) at fault
        problems: Vec<String>,
    },

    /// A requested read length range is inverted or outside the stored range
    #[error("Invalid length range [{lower}, {upper}]: {reason} (stored range is [{min}, {max}])")]
    InvalidLengthRange {
        /// Requested lower bound
        lower: u32,
        /// Requested upper bound
        upper: u32,
        /// Stored minimum read length
        min: u32,
        /// Stored maximum read length
        max: u32,
        /// What is wrong with the request
        reason: String,
    },

    /// Two containers cannot be merged
    #[error("Containers '{first}' and '{second}' are not compatible: {reason}")]
    IncompatibleContainer {
        /// Identifier of the first container
        first: String,
        /// Identifier of the second container
        second: String,
        /// The attribute or block that differs
        reason: String,
    },

    /// A transcript name is not part of the transcript table
    #[error("Transcript '{name}' not found in the reference")]
    UnknownTranscript {
        /// The transcript name
        name: String,
    },

    /// An input record could not be interpreted. Callers skip these.
    #[error("Malformed record: {line}")]
    MalformedRecord {
        /// The offending input line
        line: String,
    },

    /// A 5' position lies outside its transcript
    #[error("Position {position} is outside transcript '{transcript}' of length {length}")]
    PositionOutOfRange {
        /// Transcript name
        transcript: String,
        /// The 0-based position
        position: u32,
        /// Transcript length
        length: u32,
    },

    /// No experiment with this name exists in the container
    #[error("Experiment '{name}' does not exist")]
    ExperimentNotFound {
        /// The experiment name
        name: String,
    },

    /// Coverage was not retained for this experiment
    #[error("Experiment '{experiment}' has no stored coverage")]
    CoverageNotStored {
        /// The experiment name
        experiment: String,
    },

    /// An experiment name with characters outside `[A-Za-z0-9_.-]`
    #[error("Invalid experiment name '{name}': use at least one alphanumeric character and only alphanumerics, '_', '-' and '.'")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// An array does not have the size implied by the transcript table
    #[error("Layout mismatch in {what}: expected {expected} values, found {found}")]
    LayoutMismatch {
        /// Which array
        what: String,
        /// Size implied by the layout
        expected: usize,
        /// Actual size
        found: usize,
    },

    /// A persisted container could not be decoded
    #[error("Invalid container file: {reason}")]
    InvalidFormat {
        /// Explanation of the problem
        reason: String,
    },

    /// Free-form metadata that cannot be merged
    #[error("Invalid metadata: {reason}")]
    InvalidMetadata {
        /// Explanation of the problem
        reason: String,
    },

    /// A transcript alias table that is not one-to-one, or an unknown alias
    #[error("Alias error: {reason}")]
    Alias {
        /// Explanation of the problem
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}
