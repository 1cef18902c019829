//! The container: one transcript table and annotation shared by any number of
//! named experiments.

pub mod codec;
pub mod merge;
pub mod query;

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, ExtendedAnnotation};
use crate::error::{Result, RiboError};
use crate::layout::{FlatLayout, Rows};
use crate::metadata::normalize_metadata;
use crate::model::{ReferenceAlias, TranscriptId, TranscriptNaming, TranscriptSet};
use crate::profile::ProfileArrays;
use crate::types::{ReadLengthRange, REGION_COUNT};

pub use codec::{read_container, write_container};
pub use merge::{merge_containers, merge_files};

/// Version of the persisted layout. Files with another version are rejected.
pub const FORMAT_VERSION: &str = "1.0";
/// Version of the library that wrote a file.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Container-level attributes, persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerAttributes {
    pub reference_name: String,
    pub format_version: String,
    pub engine_version: String,
    pub length_min: u32,
    pub length_max: u32,
    pub radius: u32,
    pub left_span: u32,
    pub right_span: u32,
    /// Seconds since the Unix epoch.
    pub creation_time: u64,
}

pub(crate) fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Experiment names: at least one ASCII alphanumeric, otherwise only
/// alphanumerics, `_`, `-` and `.`.
pub fn validate_experiment_name(name: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if name.chars().all(allowed) && name.chars().any(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(RiboError::InvalidName { name: name.to_string() })
    }
}

/// One named profile plus its optional side tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    name: String,
    total_reads: u64,
    start_sites: Vec<u32>,
    stop_sites: Vec<u32>,
    region_counts: Vec<u32>,
    coverage: Option<Vec<u32>>,
    rnaseq: Option<Vec<f32>>,
    metadata: Option<String>,
}

impl Experiment {
    pub fn new(name: &str, arrays: ProfileArrays) -> Result<Self> {
        validate_experiment_name(name)?;
        let ProfileArrays { total_reads, start_sites, stop_sites, region_counts, coverage } = arrays;
        Ok(Self {
            name: name.to_string(),
            total_reads,
            start_sites,
            stop_sites,
            region_counts,
            coverage,
            rnaseq: None,
            metadata: None,
        })
    }

    /// Attach a metadata JSON object.
    pub fn with_metadata(mut self, metadata: Option<&str>) -> Result<Self> {
        self.metadata = metadata.map(normalize_metadata).transpose()?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn start_sites(&self) -> &[u32] {
        &self.start_sites
    }

    pub fn stop_sites(&self) -> &[u32] {
        &self.stop_sites
    }

    pub fn region_counts(&self) -> &[u32] {
        &self.region_counts
    }

    pub fn coverage(&self) -> Option<&[u32]> {
        self.coverage.as_deref()
    }

    pub fn has_coverage(&self) -> bool {
        self.coverage.is_some()
    }

    pub fn rnaseq(&self) -> Option<&[f32]> {
        self.rnaseq.as_deref()
    }

    pub fn has_rnaseq(&self) -> bool {
        self.rnaseq.is_some()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }
}

/// A reference, its annotation and a set of experiments quantified against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    attrs: ContainerAttributes,
    lengths: ReadLengthRange,
    transcripts: TranscriptSet,
    annotation: Annotation,
    metadata: Option<String>,
    experiments: BTreeMap<String, Experiment>,
    // read-side only, never persisted
    alias: Option<ReferenceAlias>,
}

impl Container {
    /// An empty container for one reference and one set of parameters.
    pub fn new(
        reference_name: &str,
        transcripts: TranscriptSet,
        annotation: Annotation,
        lengths: ReadLengthRange,
        radius: u32,
        left_span: u32,
        right_span: u32,
    ) -> Result<Self> {
        let attrs = ContainerAttributes {
            reference_name: reference_name.to_string(),
            format_version: FORMAT_VERSION.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            length_min: lengths.min(),
            length_max: lengths.max(),
            radius,
            left_span,
            right_span,
            creation_time: now(),
        };
        Self::from_parts(attrs, transcripts, annotation, None)
    }

    /// Assemble from already decoded parts, re-checking their agreement.
    pub(crate) fn from_parts(
        attrs: ContainerAttributes,
        transcripts: TranscriptSet,
        annotation: Annotation,
        metadata: Option<String>,
    ) -> Result<Self> {
        let lengths = ReadLengthRange::new(attrs.length_min, attrs.length_max)?;
        if annotation.len() != transcripts.len() {
            return Err(RiboError::LayoutMismatch {
                what: "annotation".to_string(),
                expected: transcripts.len(),
                found: annotation.len(),
            });
        }
        Ok(Self {
            attrs,
            lengths,
            transcripts,
            annotation,
            metadata,
            experiments: BTreeMap::new(),
            alias: None,
        })
    }

    /// Attach a container-level metadata JSON object.
    pub fn with_metadata(mut self, metadata: Option<&str>) -> Result<Self> {
        self.metadata = metadata.map(normalize_metadata).transpose()?;
        Ok(self)
    }

    /// Attach transcript aliases built for this container's transcript table.
    /// Queries then accept aliases wherever a transcript name is expected.
    pub fn with_alias(mut self, alias: ReferenceAlias) -> Result<Self> {
        if !alias.fits(&self.transcripts) {
            return Err(RiboError::Alias {
                reason: "the alias table was built for a different transcript table".to_string(),
            });
        }
        self.alias = Some(alias);
        Ok(self)
    }

    pub fn alias(&self) -> Option<&ReferenceAlias> {
        self.alias.as_ref()
    }

    /// Resolve a transcript name, or failing that an alias, to its id.
    pub fn resolve_transcript(&self, name: &str) -> Result<TranscriptId> {
        match (self.transcripts.id_of(name), &self.alias) {
            (Ok(id), _) => Ok(id),
            (Err(_), Some(alias)) => alias.id_of(name),
            (Err(e), None) => Err(e),
        }
    }

    /// Label of every transcript, in transcript order.
    pub fn transcript_labels(&self, naming: TranscriptNaming) -> Result<Vec<&str>> {
        match naming {
            TranscriptNaming::Name => Ok(self.transcripts.names().collect()),
            TranscriptNaming::Alias => {
                let alias = self.alias.as_ref().ok_or_else(|| RiboError::Alias {
                    reason: "this container has no alias table".to_string(),
                })?;
                Ok(alias.aliases().collect())
            }
        }
    }

    /// Add an experiment whose arrays match this container's layout.
    pub fn with_experiment(mut self, experiment: Experiment) -> Result<Self> {
        self.insert_experiment(experiment)?;
        Ok(self)
    }

    pub(crate) fn insert_experiment(&mut self, experiment: Experiment) -> Result<()> {
        validate_experiment_name(&experiment.name)?;
        if self.experiments.contains_key(&experiment.name) {
            return Err(RiboError::InvalidParameter {
                parameter: "experiment".to_string(),
                reason: format!("'{}' already exists in this container", experiment.name),
            });
        }
        self.check_experiment(&experiment)?;
        self.experiments.insert(experiment.name.clone(), experiment);
        Ok(())
    }

    fn check_experiment(&self, e: &Experiment) -> Result<()> {
        let windows = self.site_layout();
        windows.check("start_site_coverage", e.start_sites.len())?;
        windows.check("stop_site_coverage", e.stop_sites.len())?;
        self.region_layout().check("region_counts", e.region_counts.len())?;
        if let Some(cov) = &e.coverage {
            self.coverage_layout().check("coverage", cov.len())?;
        }
        if let Some(rnaseq) = &e.rnaseq {
            self.rnaseq_rows().check("rnaseq", rnaseq.len())?;
        }
        Ok(())
    }

    /// A copy of this container with an RNA-seq table (`n_transcripts x 5`)
    /// attached to `experiment`, replacing any previous one.
    pub fn with_rnaseq(&self, experiment: &str, table: Vec<f32>) -> Result<Container> {
        self.rnaseq_rows().check("rnaseq", table.len())?;
        let mut out = self.clone();
        let e = out
            .experiments
            .get_mut(experiment)
            .ok_or_else(|| RiboError::ExperimentNotFound { name: experiment.to_string() })?;
        e.rnaseq = Some(table);
        Ok(out)
    }

    pub fn attributes(&self) -> &ContainerAttributes {
        &self.attrs
    }

    pub fn reference_name(&self) -> &str {
        &self.attrs.reference_name
    }

    pub fn lengths(&self) -> ReadLengthRange {
        self.lengths
    }

    pub fn radius(&self) -> u32 {
        self.attrs.radius
    }

    pub fn left_span(&self) -> u32 {
        self.attrs.left_span
    }

    pub fn right_span(&self) -> u32 {
        self.attrs.right_span
    }

    pub fn creation_time(&self) -> u64 {
        self.attrs.creation_time
    }

    pub(crate) fn set_creation_time(&mut self, t: u64) {
        self.attrs.creation_time = t;
    }

    pub fn transcripts(&self) -> &TranscriptSet {
        &self.transcripts
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn extended_annotation(&self) -> ExtendedAnnotation {
        self.annotation.extended(self.attrs.left_span, self.attrs.right_span)
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Experiment names in ascending order.
    pub fn experiment_names(&self) -> impl Iterator<Item = &str> {
        self.experiments.keys().map(String::as_str)
    }

    pub fn experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.values()
    }

    pub fn experiment(&self, name: &str) -> Result<&Experiment> {
        self.experiments
            .get(name)
            .ok_or_else(|| RiboError::ExperimentNotFound { name: name.to_string() })
    }

    pub fn site_layout(&self) -> FlatLayout {
        FlatLayout::site_windows(self.lengths, &self.transcripts, self.attrs.radius)
    }

    pub fn region_layout(&self) -> FlatLayout {
        FlatLayout::region_counts(self.lengths, &self.transcripts)
    }

    pub fn coverage_layout(&self) -> FlatLayout {
        FlatLayout::coverage(self.lengths, &self.transcripts)
    }

    pub fn rnaseq_rows(&self) -> Rows {
        Rows::uniform(self.transcripts.len(), REGION_COUNT)
    }
}

/// Human-readable summary, for the `info` command and logs.
impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.attrs;
        writeln!(f, "Reference       : {}", a.reference_name)?;
        writeln!(f, "Format version  : {}", a.format_version)?;
        writeln!(f, "Engine version  : {}", a.engine_version)?;
        writeln!(f, "Created (unix)  : {}", a.creation_time)?;
        writeln!(f, "Read lengths    : {}", self.lengths)?;
        writeln!(f, "Metagene radius : {}", a.radius)?;
        writeln!(f, "Left span       : {}", a.left_span)?;
        writeln!(f, "Right span      : {}", a.right_span)?;
        writeln!(
            f,
            "Transcripts     : {} ({} nt)",
            self.transcripts.len(),
            self.transcripts.total_length()
        )?;
        writeln!(f, "Metadata        : {}", if self.metadata.is_some() { "yes" } else { "no" })?;
        writeln!(f, "Experiments     : {}", self.experiments.len())?;
        writeln!(f, "  {:<24} {:>12} {:>9} {:>7} {:>9}", "name", "reads", "coverage", "rnaseq", "metadata")?;
        let flag = |b: bool| if b { "*" } else { "" };
        for e in self.experiments.values() {
            writeln!(
                f,
                "  {:<24} {:>12} {:>9} {:>7} {:>9}",
                e.name,
                e.total_reads,
                flag(e.has_coverage()),
                flag(e.has_rnaseq()),
                flag(e.metadata.is_some())
            )?;
        }
        Ok(())
    }
}
