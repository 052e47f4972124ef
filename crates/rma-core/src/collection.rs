//! Immutable snapshot of (loop → group) assignments for one release.
//!
//! A collection is built either from a candidate grouping CSV produced by
//! the clustering run, or from the persisted membership of a committed
//! release. Group labels are opaque strings; every loop appears exactly
//! once.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rma_db::Store;

use crate::errors::PipelineError;

/// One release's worth of loop-to-group assignments, with derived indexes.
#[derive(Debug, Clone, Default)]
pub struct MotifCollection {
    loops: Vec<String>,
    groups: Vec<String>,
    release: String,
    by_group: BTreeMap<String, Vec<String>>,
    sets_by_group: BTreeMap<String, BTreeSet<String>>,
    loop_set: BTreeSet<String>,
    group_set: BTreeSet<String>,
}

impl MotifCollection {
    /// Build a collection from parallel (loop, group) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidState`] when a loop appears more
    /// than once.
    pub fn from_pairs(
        pairs: Vec<(String, String)>,
        release: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let mut collection = Self {
            release: release.into(),
            ..Self::default()
        };
        for (loop_id, group) in pairs {
            if !collection.loop_set.insert(loop_id.clone()) {
                return Err(PipelineError::invalid_state(format!(
                    "Loop {loop_id} assigned to more than one group"
                )));
            }
            collection.group_set.insert(group.clone());
            collection
                .by_group
                .entry(group.clone())
                .or_default()
                .push(loop_id.clone());
            collection
                .sets_by_group
                .entry(group.clone())
                .or_default()
                .insert(loop_id.clone());
            collection.loops.push(loop_id);
            collection.groups.push(group);
        }
        Ok(collection)
    }

    /// Read a candidate grouping CSV: two columns `loop_id,group_label`,
    /// no header, `"` as the quote character.
    pub fn from_csv(path: &Path) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .quote(b'"')
            .from_path(path)
            .map_err(|e| PipelineError::csv(path, e))?;

        let mut pairs = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::csv(path, e))?;
            let loop_id = record
                .get(0)
                .ok_or_else(|| PipelineError::csv(path, "missing loop_id column"))?;
            let group = record
                .get(1)
                .ok_or_else(|| PipelineError::csv(path, "missing group_label column"))?;
            pairs.push((loop_id.to_string(), group.to_string()));
        }
        Self::from_pairs(pairs, "")
    }

    /// Reconstruct the collection of a committed release from its persisted
    /// membership. Group labels are the committed motif ids.
    pub fn from_release(
        store: &Store,
        release_id: &str,
        motif_type: &str,
    ) -> Result<Self, PipelineError> {
        let membership = store.with_session(|session| {
            session.release_membership(release_id, motif_type)
        })?;
        let pairs = membership
            .into_iter()
            .map(|row| (row.loop_id, row.motif_id))
            .collect();
        Self::from_pairs(pairs, release_id)
    }

    /// An empty collection, used when no prior release exists.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The release tag this collection was built from; empty for candidate
    /// groupings.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// Loops in input order.
    pub fn loops(&self) -> &[String] {
        &self.loops
    }

    /// Group labels, parallel to [`loops`](Self::loops).
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// The set of all loops.
    pub fn loop_set(&self) -> &BTreeSet<String> {
        &self.loop_set
    }

    /// The set of all group labels.
    pub fn group_set(&self) -> &BTreeSet<String> {
        &self.group_set
    }

    /// Loops of one group, in input order.
    pub fn loops_in(&self, group: &str) -> &[String] {
        self.by_group
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Loops of one group, as a set.
    pub fn loop_set_of(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.sets_by_group.get(group)
    }

    /// Number of loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Whether the collection holds no loops at all.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}
