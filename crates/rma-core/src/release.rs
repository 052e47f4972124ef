//! The release committer.
//!
//! Takes a candidate collection, establishes correspondence to the previous
//! release, allocates or increments motif identifiers, and persists the
//! whole release in one transaction: release row, motif rows, memberships,
//! parents, set diffs, the release diff, and the loop order / position /
//! discrepancy tables. On any failure the transaction rolls back and a
//! compensating purge deletes everything keyed on the allocated release id.
//!
//! A release row moves allocated → composed → committed, or → aborted;
//! there is no transition out of committed.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::RngExt;
use serde::Serialize;

use rma_db::{
    DiscrepancyRow, LoopOrderRow, LoopPositionRow, MotifLoopRow, MotifRow, ParentRow,
    ReleaseDiffRow, ReleaseRow, Session, SetDiffRow,
};

use crate::collection::MotifCollection;
use crate::config::ReleaseMode;
use crate::context::Context;
use crate::errors::PipelineError;
use crate::merger::{self, Classification, MergeOutcome};

/// The very first release id of any type.
pub const FIRST_RELEASE_ID: &str = "0.1";

/// Auxiliary artifacts staged together with a release. Every field is
/// optional; absent files are skipped.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFiles {
    /// Loop-order CSV: `motif_label, loop_id, original_order, similarity_order`.
    pub loop_order: Option<PathBuf>,
    /// Loop-position CSV: `motif_label, loop_id, nt_id, position`.
    pub loop_positions: Option<PathBuf>,
    /// Mutual-discrepancy CSV: `loop_id_a, discrepancy, loop_id_b`.
    pub discrepancies: Option<PathBuf>,
    /// Directory holding `{group}.mat` files to copy-rename.
    pub mat_source: Option<PathBuf>,
    /// Destination directory for committed `.mat` files.
    pub mat_destination: Option<PathBuf>,
    /// Directory holding `{group}.png` 2D diagrams.
    pub diagram_source: Option<PathBuf>,
    /// Destination root for committed diagrams.
    pub diagram_destination: Option<PathBuf>,
    /// Graph descriptor whose `Group_NNN` labels are substituted with the
    /// committed motif ids.
    pub graph_descriptor: Option<PathBuf>,
}

/// What one commit produced, also used as the dry-run preview.
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub release_id: String,
    pub release_type: String,
    /// Group label → committed motif id.
    pub final_ids: BTreeMap<String, String>,
    pub added_groups: Vec<String>,
    pub removed_groups: Vec<String>,
    pub updated_groups: Vec<String>,
    pub same_groups: Vec<String>,
    pub added_loops: Vec<String>,
    pub removed_loops: Vec<String>,
}

/// Derive the next release id from the previous one.
pub fn next_release_id(
    previous: Option<&str>,
    mode: ReleaseMode,
) -> Result<String, PipelineError> {
    let Some(previous) = previous else {
        return Ok(FIRST_RELEASE_ID.to_string());
    };
    let (major, minor) = previous
        .split_once('.')
        .ok_or_else(|| PipelineError::MalformedReleaseId(previous.to_string()))?;
    let major: u64 = major
        .parse()
        .map_err(|_| PipelineError::MalformedReleaseId(previous.to_string()))?;
    let minor: u64 = minor
        .parse()
        .map_err(|_| PipelineError::MalformedReleaseId(previous.to_string()))?;
    Ok(match mode {
        ReleaseMode::Major => format!("{}.0", major + 1),
        ReleaseMode::Minor => format!("{major}.{}", minor + 1),
    })
}

/// Draw one candidate handle: a uniformly random zero-padded 5-digit string.
pub fn draw_handle(rng: &mut StdRng) -> String {
    format!("{:05}", rng.random_range(0..100_000u32))
}

/// Split a motif id into (type, handle, version).
pub fn parse_motif_id(id: &str) -> Result<(String, String, i64), PipelineError> {
    let (motif_type, rest) = id
        .split_once('_')
        .ok_or_else(|| PipelineError::MalformedMotifId(id.to_string()))?;
    let (handle, version) = rest
        .split_once('.')
        .ok_or_else(|| PipelineError::MalformedMotifId(id.to_string()))?;
    let version: i64 = version
        .parse()
        .map_err(|_| PipelineError::MalformedMotifId(id.to_string()))?;
    if motif_type.is_empty() || handle.is_empty() || version < 1 {
        return Err(PipelineError::MalformedMotifId(id.to_string()));
    }
    Ok((motif_type.to_string(), handle.to_string(), version))
}

fn compose_motif_id(motif_type: &str, handle: &str, version: i64) -> String {
    format!("{motif_type}_{handle}.{version}")
}

/// Commits candidate collections as new releases.
pub struct ReleaseCommitter<'a> {
    ctx: &'a Context,
}

impl<'a> ReleaseCommitter<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Commit the candidate collection as the next release of `motif_type`.
    ///
    /// In dry-run mode this plans the release, logs the classification and
    /// returns a preview whose new ids are placeholders; nothing is written.
    pub fn commit(
        &self,
        candidate: &MotifCollection,
        motif_type: &str,
        mode: ReleaseMode,
        description: &str,
        files: &ReleaseFiles,
    ) -> Result<CommitSummary, PipelineError> {
        if candidate.is_empty() {
            return Err(PipelineError::invalid_state(
                "Candidate collection holds no loops",
            ));
        }

        let previous = self
            .ctx
            .store
            .with_session(|session| session.latest_release(motif_type))?;
        let release_id = next_release_id(previous.as_ref().map(|r| r.release_id.as_str()), mode)?;
        let old = match &previous {
            Some(prev) => {
                MotifCollection::from_release(&self.ctx.store, &prev.release_id, motif_type)?
            }
            None => MotifCollection::empty(),
        };
        let outcome = merger::merge(candidate, &old);
        tracing::info!(
            release_id = %release_id,
            motif_type,
            new_loops = candidate.len(),
            old_loops = old.len(),
            new_groups = candidate.group_set().len(),
            old_groups = old.group_set().len(),
            "Planned release"
        );

        // Auxiliary CSVs are parsed before the transaction opens; a parse
        // failure aborts before anything is flushed.
        let loop_orders = read_loop_order(files.loop_order.as_deref())?;
        let loop_positions = read_loop_positions(files.loop_positions.as_deref())?;
        let discrepancies = read_discrepancies(files.discrepancies.as_deref())?;

        if self.ctx.dry_run {
            let summary =
                preview_summary(&release_id, motif_type, candidate, &old, &outcome);
            tracing::info!(
                added = summary.added_groups.len(),
                removed = summary.removed_groups.len(),
                updated = summary.updated_groups.len(),
                same = summary.same_groups.len(),
                "Dry run, not committing release"
            );
            return Ok(summary);
        }

        let committed: Result<CommitSummary, PipelineError> =
            self.ctx.store.with_session(|session| {
                self.compose(
                    session,
                    &release_id,
                    motif_type,
                    description,
                    candidate,
                    &old,
                    &outcome,
                    &loop_orders,
                    &loop_positions,
                    &discrepancies,
                    files,
                )
            });

        match committed {
            Ok(summary) => {
                tracing::info!(release_id = %release_id, motif_type, "Committed release");
                self.stage_artifacts(&summary, files);
                Ok(summary)
            }
            Err(err) => {
                tracing::error!(
                    release_id = %release_id,
                    motif_type,
                    "Release commit failed, purging: {err}"
                );
                if let Err(purge_err) = self.remove_release(&release_id, motif_type) {
                    tracing::error!("Compensating purge failed: {purge_err}");
                }
                Err(PipelineError::ReleaseAborted {
                    release_id,
                    release_type: motif_type.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Explicitly purge a release: used as the compensating action after a
    /// failed commit and by the removal path in tests and tooling.
    pub fn remove_release(&self, release_id: &str, motif_type: &str) -> Result<(), PipelineError> {
        self.ctx
            .store
            .with_session(|session| session.remove_release(release_id, motif_type))?;
        Ok(())
    }

    /// Record a release diff between two already-committed releases. Used
    /// to relate a release to a non-adjacent ancestor; `direct_parent` is
    /// derived from the actual release order.
    pub fn commit_release_diff(
        &self,
        new_release_id: &str,
        old_release_id: &str,
        motif_type: &str,
    ) -> Result<(), PipelineError> {
        let new = MotifCollection::from_release(&self.ctx.store, new_release_id, motif_type)?;
        let old = MotifCollection::from_release(&self.ctx.store, old_release_id, motif_type)?;

        let direct_parent = self
            .ctx
            .store
            .with_session(|session| -> rma_db::DbResult<bool> {
                let ordered = session.releases(motif_type)?;
                let position = ordered
                    .iter()
                    .position(|release| release.release_id == new_release_id);
                Ok(match position {
                    Some(index) if index > 0 => {
                        ordered[index - 1].release_id == old_release_id
                    }
                    _ => false,
                })
            })?;

        let diff = diff_between_releases(&new, &old, motif_type, direct_parent);
        if self.ctx.dry_run {
            tracing::info!(
                new_release_id,
                old_release_id,
                "Dry run, not storing release diff"
            );
            return Ok(());
        }
        self.ctx
            .store
            .with_session(|session| session.insert_release_diff(&diff))?;
        Ok(())
    }

    /// Compose every row of the release inside one open session.
    #[allow(clippy::too_many_arguments)]
    fn compose(
        &self,
        session: &Session<'_>,
        release_id: &str,
        motif_type: &str,
        description: &str,
        candidate: &MotifCollection,
        old: &MotifCollection,
        outcome: &MergeOutcome,
        loop_orders: &[AuxOrder],
        loop_positions: &[AuxPosition],
        discrepancies: &[DiscrepancyRow],
        files: &ReleaseFiles,
    ) -> Result<CommitSummary, PipelineError> {
        session.insert_release(&ReleaseRow {
            release_id: release_id.to_string(),
            release_type: motif_type.to_string(),
            date: Utc::now(),
            description: description.to_string(),
            graph: None,
        })?;

        let mut summary = CommitSummary {
            release_id: release_id.to_string(),
            release_type: motif_type.to_string(),
            final_ids: BTreeMap::new(),
            added_groups: Vec::new(),
            removed_groups: Vec::new(),
            updated_groups: Vec::new(),
            same_groups: Vec::new(),
            added_loops: set_difference(candidate.loop_set(), old.loop_set()),
            removed_loops: set_difference(old.loop_set(), candidate.loop_set()),
        };
        let mut old_updated: BTreeSet<String> = BTreeSet::new();

        for group in candidate.group_set() {
            let decision = outcome
                .decisions
                .get(group)
                .ok_or_else(|| {
                    PipelineError::invalid_state(format!("Group {group} was never classified"))
                })?;

            let (motif_id, handle, version, parents): (String, String, i64, Vec<String>) =
                match &decision.classification {
                    Classification::New { parents } => {
                        let handle = self.allocate_handle(session)?;
                        let motif_id = compose_motif_id(motif_type, &handle, 1);
                        summary.added_groups.push(motif_id.clone());
                        tracing::info!("Group {group} assigned new id {motif_id}");
                        (motif_id, handle, 1, parents.clone())
                    }
                    Classification::Updated { motif_id, parents } => {
                        let (_, handle, version) = parse_motif_id(motif_id)?;
                        let new_id = compose_motif_id(motif_type, &handle, version + 1);
                        summary.updated_groups.push(new_id.clone());
                        old_updated.insert(motif_id.clone());
                        tracing::info!(
                            "Group {group} corresponds to motif {motif_id} and is assigned new id {new_id}"
                        );
                        let mut parents = parents.clone();
                        parents.push(motif_id.clone());
                        (new_id, handle, version + 1, parents)
                    }
                    Classification::ExactMatch { motif_id } => {
                        let (_, handle, version) = parse_motif_id(motif_id)?;
                        summary.same_groups.push(motif_id.clone());
                        tracing::info!("Group {group} matches exactly motif {motif_id}");
                        (motif_id.clone(), handle, version, Vec::new())
                    }
                };

            session.insert_motif(&MotifRow {
                motif_id: motif_id.clone(),
                release_id: release_id.to_string(),
                motif_type: motif_type.to_string(),
                handle,
                version,
                comment: decision.explanation.to_string(),
            })?;

            for loop_id in candidate.loops_in(group) {
                session.insert_motif_loop(&MotifLoopRow {
                    loop_id: loop_id.clone(),
                    motif_id: motif_id.clone(),
                    release_id: release_id.to_string(),
                })?;
            }

            let parents: BTreeSet<String> = parents.into_iter().collect();
            for parent in &parents {
                session.insert_parent(&ParentRow {
                    motif_id: motif_id.clone(),
                    release_id: release_id.to_string(),
                    parent_motif_id: parent.clone(),
                })?;
            }

            summary.final_ids.insert(group.clone(), motif_id);
        }

        summary.removed_groups = old
            .group_set()
            .iter()
            .filter(|id| !old_updated.contains(*id) && !summary.same_groups.contains(*id))
            .cloned()
            .collect();

        self.compose_set_diffs(session, release_id, candidate, outcome, &summary.final_ids)?;

        if release_id != FIRST_RELEASE_ID && !old.release().is_empty() {
            session.insert_release_diff(&release_diff_row(
                release_id,
                old.release(),
                motif_type,
                true,
                &summary,
            ))?;
        }

        for row in loop_orders {
            let motif_id = remap_label(&summary.final_ids, &row.motif_label)?;
            session.insert_loop_order(&LoopOrderRow {
                motif_id,
                loop_id: row.loop_id.clone(),
                release_id: release_id.to_string(),
                original_order: row.original_order,
                similarity_order: row.similarity_order,
            })?;
        }
        for row in loop_positions {
            let motif_id = remap_label(&summary.final_ids, &row.motif_label)?;
            session.insert_loop_position(&LoopPositionRow {
                motif_id,
                loop_id: row.loop_id.clone(),
                release_id: release_id.to_string(),
                unit_id: row.unit_id.clone(),
                position: row.position,
            })?;
        }
        for row in discrepancies {
            session.insert_discrepancy(&DiscrepancyRow {
                release_id: release_id.to_string(),
                ..row.clone()
            })?;
        }

        if let Some(path) = &files.graph_descriptor {
            if path.exists() {
                let contents = fs::read_to_string(path)?;
                let substituted = substitute_graph_labels(&contents, &summary.final_ids);
                session.set_release_graph(release_id, motif_type, &substituted)?;
            }
        }

        Ok(summary)
    }

    /// Emit both orientations of a SetDiff row for every (new, old) motif
    /// pair with a non-empty intersection, skipping self pairs.
    fn compose_set_diffs(
        &self,
        session: &Session<'_>,
        release_id: &str,
        candidate: &MotifCollection,
        outcome: &MergeOutcome,
        final_ids: &BTreeMap<String, String>,
    ) -> Result<(), PipelineError> {
        for group in candidate.group_set() {
            let Some(matches) = outcome.matches_of(group) else {
                continue;
            };
            let final_id = remap_label(final_ids, group)?;
            for (old_motif, shared) in matches {
                if *old_motif == final_id {
                    continue;
                }
                let forward_diff = joined(
                    outcome
                        .setdiffs
                        .get(group)
                        .and_then(|row| row.get(old_motif)),
                );
                let backward_diff = joined(
                    outcome
                        .setdiffs
                        .get(old_motif)
                        .and_then(|row| row.get(group)),
                );
                let intersection = shared.iter().cloned().collect::<Vec<_>>().join(",");

                session.insert_set_diff(&SetDiffRow {
                    motif_id1: final_id.clone(),
                    motif_id2: old_motif.clone(),
                    release_id: release_id.to_string(),
                    intersection: intersection.clone(),
                    overlap: outcome.overlap(group, old_motif).unwrap_or(0.0),
                    one_minus_two: forward_diff.clone(),
                    two_minus_one: backward_diff.clone(),
                })?;
                session.insert_set_diff(&SetDiffRow {
                    motif_id1: old_motif.clone(),
                    motif_id2: final_id.clone(),
                    release_id: release_id.to_string(),
                    intersection,
                    overlap: outcome.overlap(old_motif, group).unwrap_or(0.0),
                    one_minus_two: backward_diff,
                    two_minus_one: forward_diff,
                })?;
            }
        }
        Ok(())
    }

    /// Draw handles until one is free of both the motif table and the
    /// reserved pool, then reserve it. Allocation happens inside the open
    /// release transaction, which serializes the shared handle space.
    fn allocate_handle(&self, session: &Session<'_>) -> Result<String, PipelineError> {
        loop {
            let candidate = self.ctx.with_rng(draw_handle);
            if session.handle_in_use(&candidate)? {
                tracing::debug!(handle = %candidate, "Handle already in use, redrawing");
                continue;
            }
            if session.handle_reserved(&candidate)? {
                tracing::debug!(handle = %candidate, "Handle reserved, redrawing");
                continue;
            }
            session.reserve_handle(&candidate)?;
            return Ok(candidate);
        }
    }

    /// Copy `.mat` files and 2D diagrams to their destinations, renaming to
    /// the committed motif ids. Best effort: a missing source file is
    /// logged, never fatal; the release is already committed.
    fn stage_artifacts(&self, summary: &CommitSummary, files: &ReleaseFiles) {
        if let (Some(source), Some(destination)) = (&files.mat_source, &files.mat_destination) {
            for (group, motif_id) in &summary.final_ids {
                let src = source.join(format!("{group}.mat"));
                let dst = destination.join(format!("{motif_id}.mat"));
                copy_artifact(&src, &dst);
            }
        }

        if let (Some(source), Some(destination)) =
            (&files.diagram_source, &files.diagram_destination)
        {
            let release_dir = destination.join(format!(
                "{}{}",
                summary.release_type, summary.release_id
            ));
            for (group, motif_id) in &summary.final_ids {
                let src = source.join(format!("{group}.png"));
                let dst = release_dir.join(format!("{motif_id}.png"));
                copy_artifact(&src, &dst);
            }
        }
    }
}

fn copy_artifact(src: &Path, dst: &Path) {
    if !src.exists() {
        tracing::warn!("File {} wasn't found", src.display());
        return;
    }
    if let Some(parent) = dst.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("Could not create {}: {err}", parent.display());
            return;
        }
    }
    if let Err(err) = fs::copy(src, dst) {
        tracing::warn!(
            "Could not copy {} to {}: {err}",
            src.display(),
            dst.display()
        );
    }
}

/// Substitute every `Group_NNN` label with its committed motif id and strip
/// newlines.
pub fn substitute_graph_labels(
    contents: &str,
    final_ids: &BTreeMap<String, String>,
) -> String {
    let mut out = contents.to_string();
    for (group, motif_id) in final_ids {
        let suffix = group.rsplit('_').next().unwrap_or(group);
        out = out.replace(&format!("Group_{suffix}"), motif_id);
    }
    out.replace('\n', "")
}

fn remap_label(
    final_ids: &BTreeMap<String, String>,
    label: &str,
) -> Result<String, PipelineError> {
    final_ids.get(label).cloned().ok_or_else(|| {
        PipelineError::invalid_state(format!("Label {label} is not part of the new collection"))
    })
}

fn set_difference(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
    a.difference(b).cloned().collect()
}

fn joined(set: Option<&BTreeSet<String>>) -> String {
    set.map(|s| s.iter().cloned().collect::<Vec<_>>().join(","))
        .unwrap_or_default()
}

fn release_diff_row(
    release_id: &str,
    old_release_id: &str,
    motif_type: &str,
    direct_parent: bool,
    summary: &CommitSummary,
) -> ReleaseDiffRow {
    ReleaseDiffRow {
        release_id1: release_id.to_string(),
        release_id2: old_release_id.to_string(),
        release_type: motif_type.to_string(),
        direct_parent,
        added_groups: summary.added_groups.join(", "),
        removed_groups: summary.removed_groups.join(", "),
        updated_groups: summary.updated_groups.join(", "),
        same_groups: summary.same_groups.join(", "),
        added_loops: summary.added_loops.join(", "),
        removed_loops: summary.removed_loops.join(", "),
        num_added_groups: summary.added_groups.len() as i64,
        num_removed_groups: summary.removed_groups.len() as i64,
        num_updated_groups: summary.updated_groups.len() as i64,
        num_same_groups: summary.same_groups.len() as i64,
        num_added_loops: summary.added_loops.len() as i64,
        num_removed_loops: summary.removed_loops.len() as i64,
    }
}

/// Group and loop set differences between two committed releases, where
/// group labels on both sides are motif ids.
fn diff_between_releases(
    new: &MotifCollection,
    old: &MotifCollection,
    motif_type: &str,
    direct_parent: bool,
) -> ReleaseDiffRow {
    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut same = Vec::new();
    let mut old_updated: BTreeSet<String> = BTreeSet::new();

    let old_handles: BTreeMap<String, String> = old
        .group_set()
        .iter()
        .filter_map(|id| {
            parse_motif_id(id)
                .ok()
                .map(|(_, handle, _)| (handle, id.clone()))
        })
        .collect();

    for motif_id in new.group_set() {
        if old.group_set().contains(motif_id) {
            same.push(motif_id.clone());
            continue;
        }
        match parse_motif_id(motif_id)
            .ok()
            .and_then(|(_, handle, _)| old_handles.get(&handle))
        {
            Some(old_id) => {
                updated.push(motif_id.clone());
                old_updated.insert(old_id.clone());
            }
            None => added.push(motif_id.clone()),
        }
    }

    let removed: Vec<String> = old
        .group_set()
        .iter()
        .filter(|id| !same.contains(*id) && !old_updated.contains(*id))
        .cloned()
        .collect();
    let added_loops = set_difference(new.loop_set(), old.loop_set());
    let removed_loops = set_difference(old.loop_set(), new.loop_set());

    ReleaseDiffRow {
        release_id1: new.release().to_string(),
        release_id2: old.release().to_string(),
        release_type: motif_type.to_string(),
        direct_parent,
        added_groups: added.join(", "),
        removed_groups: removed.join(", "),
        updated_groups: updated.join(", "),
        same_groups: same.join(", "),
        added_loops: added_loops.join(", "),
        removed_loops: removed_loops.join(", "),
        num_added_groups: added.len() as i64,
        num_removed_groups: removed.len() as i64,
        num_updated_groups: updated.len() as i64,
        num_same_groups: same.len() as i64,
        num_added_loops: added_loops.len() as i64,
        num_removed_loops: removed_loops.len() as i64,
    }
}

/// Dry-run preview: exact and updated groups get their real ids, new
/// groups a placeholder, since handles are only drawn inside a commit.
fn preview_summary(
    release_id: &str,
    motif_type: &str,
    candidate: &MotifCollection,
    old: &MotifCollection,
    outcome: &MergeOutcome,
) -> CommitSummary {
    let mut summary = CommitSummary {
        release_id: release_id.to_string(),
        release_type: motif_type.to_string(),
        final_ids: BTreeMap::new(),
        added_groups: Vec::new(),
        removed_groups: Vec::new(),
        updated_groups: Vec::new(),
        same_groups: Vec::new(),
        added_loops: set_difference(candidate.loop_set(), old.loop_set()),
        removed_loops: set_difference(old.loop_set(), candidate.loop_set()),
    };
    let mut old_updated = BTreeSet::new();

    for group in candidate.group_set() {
        let Some(decision) = outcome.decisions.get(group) else {
            continue;
        };
        let id = match &decision.classification {
            Classification::ExactMatch { motif_id } => {
                summary.same_groups.push(motif_id.clone());
                motif_id.clone()
            }
            Classification::Updated { motif_id, .. } => {
                old_updated.insert(motif_id.clone());
                match parse_motif_id(motif_id) {
                    Ok((_, handle, version)) => {
                        let id = compose_motif_id(motif_type, &handle, version + 1);
                        summary.updated_groups.push(id.clone());
                        id
                    }
                    Err(_) => motif_id.clone(),
                }
            }
            Classification::New { .. } => {
                let id = format!("{motif_type}_?????.1");
                summary.added_groups.push(id.clone());
                id
            }
        };
        summary.final_ids.insert(group.clone(), id);
    }

    summary.removed_groups = old
        .group_set()
        .iter()
        .filter(|id| !old_updated.contains(*id) && !summary.same_groups.contains(*id))
        .cloned()
        .collect();
    summary
}

// ----------------------------------------------------------------------
// Auxiliary CSV parsing
// ----------------------------------------------------------------------

/// Parsed loop-order CSV row, still keyed by the group label.
#[derive(Debug, Clone)]
struct AuxOrder {
    motif_label: String,
    loop_id: String,
    original_order: i64,
    similarity_order: i64,
}

/// Parsed loop-position CSV row, still keyed by the group label.
#[derive(Debug, Clone)]
struct AuxPosition {
    motif_label: String,
    loop_id: String,
    unit_id: String,
    position: i64,
}

fn csv_reader(path: &Path) -> Result<csv::Reader<fs::File>, PipelineError> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .quote(b'"')
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))
}

fn field(record: &csv::StringRecord, index: usize, path: &Path) -> Result<String, PipelineError> {
    record
        .get(index)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::csv(path, format!("missing column {index}")))
}

fn numeric(raw: &str, path: &Path) -> Result<i64, PipelineError> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::csv(path, format!("`{raw}` is not an integer")))
}

fn read_loop_order(path: Option<&Path>) -> Result<Vec<AuxOrder>, PipelineError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let mut rows = Vec::new();
    for record in csv_reader(path)?.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        rows.push(AuxOrder {
            motif_label: field(&record, 0, path)?,
            loop_id: field(&record, 1, path)?,
            original_order: numeric(&field(&record, 2, path)?, path)?,
            similarity_order: numeric(&field(&record, 3, path)?, path)?,
        });
    }
    Ok(rows)
}

fn read_loop_positions(path: Option<&Path>) -> Result<Vec<AuxPosition>, PipelineError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let mut rows = Vec::new();
    for record in csv_reader(path)?.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        rows.push(AuxPosition {
            motif_label: field(&record, 0, path)?,
            loop_id: field(&record, 1, path)?,
            unit_id: field(&record, 2, path)?,
            position: numeric(&field(&record, 3, path)?, path)?,
        });
    }
    Ok(rows)
}

fn read_discrepancies(path: Option<&Path>) -> Result<Vec<DiscrepancyRow>, PipelineError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let mut rows = Vec::new();
    for record in csv_reader(path)?.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        let discrepancy: f64 = field(&record, 1, path)?
            .trim()
            .parse()
            .map_err(|_| PipelineError::csv(path, "discrepancy is not a number"))?;
        rows.push(DiscrepancyRow {
            loop_id1: field(&record, 0, path)?,
            loop_id2: field(&record, 2, path)?,
            release_id: String::new(),
            discrepancy,
        });
    }
    Ok(rows)
}
