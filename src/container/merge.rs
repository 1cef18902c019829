use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::container::{now, Container};
use crate::error::{Result, RiboError};
use crate::metadata::merge_metadata;

/// Check that `second` can be merged into `first`; `labels` name them in
/// the error.
fn check_pair(first: (&str, &Container), second: (&str, &Container)) -> Result<()> {
    let (a_label, a) = first;
    let (b_label, b) = second;
    let fail = |reason: String| RiboError::IncompatibleContainer {
        first: a_label.to_string(),
        second: b_label.to_string(),
        reason,
    };

    let (x, y) = (a.attributes(), b.attributes());
    let attrs: [(&str, String, String); 7] = [
        ("reference_name", x.reference_name.clone(), y.reference_name.clone()),
        ("format_version", x.format_version.clone(), y.format_version.clone()),
        ("length_min", x.length_min.to_string(), y.length_min.to_string()),
        ("length_max", x.length_max.to_string(), y.length_max.to_string()),
        ("radius", x.radius.to_string(), y.radius.to_string()),
        ("left_span", x.left_span.to_string(), y.left_span.to_string()),
        ("right_span", x.right_span.to_string(), y.right_span.to_string()),
    ];
    for (name, va, vb) in attrs {
        if va != vb {
            return Err(fail(format!("attribute {name} differs: {va} != {vb}")));
        }
    }

    let (ta, tb) = (a.transcripts(), b.transcripts());
    if ta.len() != tb.len() {
        return Err(fail(format!("different number of transcripts: {} != {}", ta.len(), tb.len())));
    }
    if let Some((na, nb)) = ta.names().zip(tb.names()).find(|(na, nb)| na != nb) {
        return Err(fail(format!("different transcript names ({na} vs {nb})")));
    }
    if let Some(t) = ta.iter().zip(tb.iter()).find(|(p, q)| p.length != q.length).map(|(p, _)| p) {
        return Err(fail(format!("different length for transcript {}", t.name)));
    }
    if let Some(t) = (0..ta.len()).find(|&t| a.annotation().get(t) != b.annotation().get(t)) {
        return Err(fail(format!("different annotation for transcript {}", ta.name(t))));
    }
    Ok(())
}

/// Union the experiments of several compatible containers.
///
/// Everything is validated before anything is copied: experiment names must
/// be unique across all inputs, and every input must match the first in its
/// attributes, transcript table and annotation. Container metadata is merged
/// with later inputs winning on key conflicts. The result gets a fresh
/// creation time.
pub fn merge_containers(inputs: &[(&str, &Container)]) -> Result<Container> {
    let Some(&(_, base)) = inputs.first() else {
        return Err(RiboError::InvalidParameter {
            parameter: "inputs".to_string(),
            reason: "nothing to merge".to_string(),
        });
    };

    let mut owner: HashMap<&str, &str> = HashMap::new();
    for &(label, c) in inputs {
        for name in c.experiment_names() {
            if let Some(prev) = owner.insert(name, label) {
                return Err(RiboError::IncompatibleContainer {
                    first: prev.to_string(),
                    second: label.to_string(),
                    reason: format!("both contain experiment '{name}'"),
                });
            }
        }
    }
    for &other in &inputs[1..] {
        check_pair(inputs[0], other)?;
    }
    let metadata = merge_metadata(inputs.iter().map(|(_, c)| c.metadata()))?;

    let mut merged = Container::from_parts(
        base.attributes().clone(),
        base.transcripts().clone(),
        base.annotation().clone(),
        metadata,
    )?;
    merged.alias = base.alias.clone();
    for (_, c) in inputs {
        for e in c.experiments() {
            merged.insert_experiment(e.clone())?;
        }
    }
    merged.set_creation_time(now());

    info!(
        "merged {} container(s) into {} experiment(s)",
        inputs.len(),
        merged.experiments().count()
    );
    Ok(merged)
}

/// Merge container files into `output`. At least two inputs are required;
/// nothing is written unless every input loads and validates.
pub fn merge_files(output: &Path, inputs: &[PathBuf]) -> Result<Container> {
    if inputs.len() < 2 {
        return Err(RiboError::InvalidParameter {
            parameter: "inputs".to_string(),
            reason: format!("at least two container files are required, got {}", inputs.len()),
        });
    }
    let loaded = inputs
        .iter()
        .map(|p| Ok((p.display().to_string(), Container::load(p)?)))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<(&str, &Container)> = loaded.iter().map(|(l, c)| (l.as_str(), c)).collect();

    let merged = merge_containers(&refs)?;
    merged.save(output)?;
    Ok(merged)
}
