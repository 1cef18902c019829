//! Alternative, usually shorter, names for the transcripts of a reference.

use std::collections::HashMap;

use crate::error::{Result, RiboError};
use crate::model::transcript::TranscriptSet;
use crate::model::types::TranscriptId;

/// Alias for an APPRIS human transcript name such as
/// `ENST00000335137.4|ENSG00000186092.6|-|-|OR4F5-201|OR4F5|1054|protein_coding|`,
/// which is its fifth `|`-separated field (`OR4F5-201`).
pub fn apris_human_alias(name: &str) -> Option<String> {
    name.split('|').nth(4).map(str::to_string)
}

/// A one-to-one renaming of a transcript table.
///
/// Built against a [`TranscriptSet`] and kept in its order, so `alias(id)`
/// and `id_of(alias)` are inverse to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAlias {
    names: Vec<String>,
    aliases: Vec<String>,
    by_alias: HashMap<String, TranscriptId>,
}

impl ReferenceAlias {
    /// Derive an alias for every transcript with `rename`.
    ///
    /// Fails when `rename` gives no alias or an empty one for some transcript,
    /// or when two transcripts end up with the same alias.
    pub fn new<F>(transcripts: &TranscriptSet, rename: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let aliases = transcripts
            .names()
            .map(|name| {
                rename(name).ok_or_else(|| RiboError::Alias {
                    reason: format!("no alias could be derived for '{name}'"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::build(transcripts, aliases)
    }

    /// Aliases from an explicit `name -> alias` table covering every transcript.
    pub fn from_map(transcripts: &TranscriptSet, map: &HashMap<String, String>) -> Result<Self> {
        Self::new(transcripts, |name| map.get(name).cloned())
    }

    fn build(transcripts: &TranscriptSet, aliases: Vec<String>) -> Result<Self> {
        let mut by_alias = HashMap::with_capacity(aliases.len());
        for (id, alias) in aliases.iter().enumerate() {
            if alias.is_empty() {
                return Err(RiboError::Alias {
                    reason: format!("empty alias for '{}'", transcripts.name(id)),
                });
            }
            if let Some(prev) = by_alias.insert(alias.clone(), id) {
                return Err(RiboError::Alias {
                    reason: format!(
                        "'{}' and '{}' share the alias '{alias}'; aliases must be one-to-one",
                        transcripts.name(prev),
                        transcripts.name(id)
                    ),
                });
            }
        }
        let names = transcripts.names().map(str::to_string).collect();
        Ok(Self { names, aliases, by_alias })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Whether this alias table was built for `transcripts`.
    pub fn fits(&self, transcripts: &TranscriptSet) -> bool {
        self.names.len() == transcripts.len() && self.names.iter().map(String::as_str).eq(transcripts.names())
    }

    pub fn alias(&self, id: TranscriptId) -> &str {
        &self.aliases[id]
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    pub fn id_of(&self, alias: &str) -> Result<TranscriptId> {
        self.by_alias
            .get(alias)
            .copied()
            .ok_or_else(|| RiboError::Alias { reason: format!("no such alias: '{alias}'") })
    }

    /// The original transcript name behind `alias`.
    pub fn original_name(&self, alias: &str) -> Result<&str> {
        Ok(&self.names[self.id_of(alias)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPRIS: [&str; 2] = [
        "ENST00000335137.4|ENSG00000186092.6|-|-|OR4F5-201|OR4F5|1054|protein_coding|",
        "ENST00000426406.3|ENSG00000284733.1|-|-|OR4F29-201|OR4F29|995|protein_coding|",
    ];

    fn appris_set() -> TranscriptSet {
        TranscriptSet::new([(APPRIS[0], 1054u32), (APPRIS[1], 995)]).unwrap()
    }

    #[test]
    fn apris_alias_is_the_fifth_field() {
        assert_eq!(apris_human_alias(APPRIS[0]).as_deref(), Some("OR4F5-201"));
        assert_eq!(apris_human_alias("ENST0001|ENSG0001"), None);
    }

    #[test]
    fn aliases_map_both_ways() {
        let set = appris_set();
        let alias = ReferenceAlias::new(&set, apris_human_alias).unwrap();
        assert_eq!(alias.alias(1), "OR4F29-201");
        assert_eq!(alias.id_of("OR4F5-201").unwrap(), 0);
        assert_eq!(alias.original_name("OR4F29-201").unwrap(), APPRIS[1]);
        assert!(alias.fits(&set));
        assert!(matches!(alias.id_of("GAPDH-201"), Err(RiboError::Alias { .. })));
    }

    #[test]
    fn non_injective_renaming_is_rejected() {
        let set = TranscriptSet::new([("T1.1", 10u32), ("T1.2", 12), ("T2.1", 8)]).unwrap();
        let gene = |name: &str| name.split('.').next().map(str::to_string);
        let err = ReferenceAlias::new(&set, gene).unwrap_err();
        assert!(format!("{err}").contains("one-to-one"), "{err}");
    }

    #[test]
    fn missing_and_empty_aliases_are_rejected() {
        let set = TranscriptSet::new([("a", 10u32), ("b", 12)]).unwrap();
        let partial: HashMap<String, String> = [("a".to_string(), "A".to_string())].into();
        assert!(matches!(ReferenceAlias::from_map(&set, &partial), Err(RiboError::Alias { .. })));
        assert!(matches!(
            ReferenceAlias::new(&set, |_| Some(String::new())),
            Err(RiboError::Alias { .. })
        ));
        assert!(!ReferenceAlias::new(&set, |n| Some(n.to_uppercase())).unwrap().fits(&appris_set()));
    }
}
