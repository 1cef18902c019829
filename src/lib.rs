//! ribo_profile
//!
//! Storage and quantification of ribosome profiling experiments. Alignments
//! (transcript, 5' position, read length) are turned into per-read-length
//! coverage, start/stop site windows and region counts, kept in flat
//! length-major arrays inside a checksummed container file that can be
//! queried over read-length ranges and merged with compatible containers.

pub mod aggregate;
pub mod annotation;
pub mod config;
pub mod container;
pub mod create;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod profile;
pub mod quantify;
pub mod rnaseq;
pub mod types;

pub use aggregate::{aggregate, AggregateMode, LengthAggregate};
pub use annotation::{AlignmentRecord, Annotation, AnnotationBuilder, ExtendedAnnotation, TranscriptRegions};
pub use config::CreateOptions;
pub use container::{merge_containers, merge_files, Container, ContainerAttributes, Experiment};
pub use create::{create_container, create_container_from_records, create_file};
pub use error::{Result, RiboError};
pub use layout::FlatLayout;
pub use model::{apris_human_alias, ByTranscript, ExperimentTable, ReferenceAlias, TableRow, TranscriptId, TranscriptNaming, TranscriptSet};
pub use profile::{ProfileArrays, ProfileWriter};
pub use quantify::{LengthProfile, QuantifyParams};
pub use types::{BaseRegion, Interval, ReadLengthRange, Region, SiteType};
