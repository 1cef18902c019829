use std::path::PathBuf;

use crate::error::{Result, RiboError};
use crate::types::ReadLengthRange;

/// Parameters of a profile creation run.
///
/// Defaults: lengths 15..=35, radius 50, left span 35, right span 15,
/// coverage kept, one worker, system temp dir.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    pub reference_name: String,
    pub length_min: u32,
    pub length_max: u32,
    pub radius: u32,
    pub left_span: u32,
    pub right_span: u32,
    pub store_coverage: bool,
    pub threads: usize,
    pub tmp_dir: Option<PathBuf>,
    /// JSON object attached to the experiment.
    pub experiment_metadata: Option<String>,
    /// JSON object attached to the container.
    pub container_metadata: Option<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            reference_name: "reference".to_string(),
            length_min: 15,
            length_max: 35,
            radius: 50,
            left_span: 35,
            right_span: 15,
            store_coverage: true,
            threads: 1,
            tmp_dir: None,
            experiment_metadata: None,
            container_metadata: None,
        }
    }
}

impl CreateOptions {
    pub fn new(reference_name: &str) -> Self {
        Self { reference_name: reference_name.to_string(), ..Self::default() }
    }

    pub fn lengths(mut self, min: u32, max: u32) -> Self {
        self.length_min = min;
        self.length_max = max;
        self
    }

    pub fn radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn spans(mut self, left: u32, right: u32) -> Self {
        self.left_span = left;
        self.right_span = right;
        self
    }

    pub fn store_coverage(mut self, keep: bool) -> Self {
        self.store_coverage = keep;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(dir.into());
        self
    }

    pub fn experiment_metadata(mut self, json: impl Into<String>) -> Self {
        self.experiment_metadata = Some(json.into());
        self
    }

    pub fn container_metadata(mut self, json: impl Into<String>) -> Self {
        self.container_metadata = Some(json.into());
        self
    }

    /// Check everything that can be checked before reading any input.
    pub fn validate(&self) -> Result<ReadLengthRange> {
        if self.reference_name.trim().is_empty() {
            return Err(RiboError::InvalidParameter {
                parameter: "reference_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.threads == 0 {
            return Err(RiboError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        ReadLengthRange::new(self.length_min, self.length_max)
    }
}
