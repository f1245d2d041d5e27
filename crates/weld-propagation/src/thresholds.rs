//! Per-criterion pass/fail cutoffs.
//!
//! A criterion (e.g. "Strength") may carry several cutoffs keyed by a source
//! identifier (dataset, standard, supplier). Only one of them is used: the
//! source named as `canonical` when present, otherwise the first pair in the
//! order the table was built or deserialized. Order is kept in an explicit
//! list of pairs so it never depends on hash map iteration.
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, WeldError};

/// Reserved key inside a criterion object that names the canonical source.
pub const CANONICAL_KEY: &str = "canonical";

/// Ordered cutoffs for one criterion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriterionThresholds {
    cutoffs: Vec<(String, f64)>,
    canonical: Option<String>,
}

impl CriterionThresholds {
    pub fn new(cutoffs: Vec<(String, f64)>) -> Self {
        Self {
            cutoffs,
            canonical: None,
        }
    }

    pub fn with_canonical(mut self, source: impl Into<String>) -> Self {
        self.canonical = Some(source.into());
        self
    }

    pub fn push(&mut self, source: impl Into<String>, cutoff: f64) {
        self.cutoffs.push((source.into(), cutoff));
    }

    pub fn cutoffs(&self) -> &[(String, f64)] {
        &self.cutoffs
    }

    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    /// Resolve the cutoff in effect for this criterion.
    fn resolve(&self, criterion: &str) -> Result<f64> {
        match &self.canonical {
            Some(source) => self
                .cutoffs
                .iter()
                .find(|(name, _)| name == source)
                .map(|(_, cutoff)| *cutoff)
                .ok_or_else(|| {
                    WeldError::configuration(
                        criterion,
                        format!("missing threshold: canonical source '{}' has no cutoff", source),
                    )
                }),
            None => self
                .cutoffs
                .first()
                .map(|(_, cutoff)| *cutoff)
                .ok_or_else(|| {
                    WeldError::configuration(criterion, "missing threshold: no cutoff configured")
                }),
        }
    }
}

/// Cutoff table for every criterion, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thresholds {
    criteria: Vec<(String, CriterionThresholds)>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the cutoffs of a criterion. Replacing keeps the
    /// criterion's original position.
    pub fn insert(&mut self, criterion: impl Into<String>, thresholds: CriterionThresholds) {
        let criterion = criterion.into();
        match self.criteria.iter_mut().find(|(name, _)| *name == criterion) {
            Some((_, existing)) => *existing = thresholds,
            None => self.criteria.push((criterion, thresholds)),
        }
    }

    /// Builder-style helper appending one `(source, cutoff)` pair.
    pub fn with_cutoff(mut self, criterion: &str, source: &str, cutoff: f64) -> Self {
        match self.criteria.iter_mut().find(|(name, _)| name == criterion) {
            Some((_, existing)) => existing.push(source, cutoff),
            None => self.criteria.push((
                criterion.to_string(),
                CriterionThresholds::new(vec![(source.to_string(), cutoff)]),
            )),
        }
        self
    }

    pub fn get(&self, criterion: &str) -> Option<&CriterionThresholds> {
        self.criteria
            .iter()
            .find(|(name, _)| name == criterion)
            .map(|(_, thresholds)| thresholds)
    }

    /// Cutoff used to binarize `criterion`.
    pub fn cutoff(&self, criterion: &str) -> Result<f64> {
        self.get(criterion)
            .ok_or_else(|| {
                WeldError::configuration(
                    criterion,
                    "missing threshold: criterion not in threshold table",
                )
            })?
            .resolve(criterion)
    }

    pub fn criteria(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl Serialize for CriterionThresholds {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.cutoffs.len() + usize::from(self.canonical.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (source, cutoff) in &self.cutoffs {
            map.serialize_entry(source, cutoff)?;
        }
        if let Some(canonical) = &self.canonical {
            map.serialize_entry(CANONICAL_KEY, canonical)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CriterionThresholds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CutoffVisitor;

        impl<'de> Visitor<'de> for CutoffVisitor {
            type Value = CriterionThresholds;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map from source name to numeric cutoff")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut thresholds = CriterionThresholds::default();
                while let Some(key) = access.next_key::<String>()? {
                    if key == CANONICAL_KEY {
                        thresholds.canonical = Some(access.next_value::<String>()?);
                    } else {
                        let cutoff = access.next_value::<f64>()?;
                        thresholds.push(key, cutoff);
                    }
                }
                Ok(thresholds)
            }
        }

        deserializer.deserialize_map(CutoffVisitor)
    }
}

impl Serialize for Thresholds {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.criteria.len()))?;
        for (criterion, thresholds) in &self.criteria {
            map.serialize_entry(criterion, thresholds)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Thresholds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = Thresholds;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map from criterion name to a map of cutoffs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut table = Thresholds::new();
                while let Some((criterion, thresholds)) =
                    access.next_entry::<String, CriterionThresholds>()?
                {
                    table.insert(criterion, thresholds);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
