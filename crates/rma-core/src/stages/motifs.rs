//! The motif release stage.
//!
//! Mass stage, one transaction per motif type: picks up the clustering
//! results staged under the search directory, builds the candidate
//! collection, establishes correspondence to the latest release and commits
//! the new release atomically. Types with nothing staged are passed over;
//! if no type has results the whole stage opts out.

use std::path::{Path, PathBuf};

use crate::collection::MotifCollection;
use crate::context::Context;
use crate::errors::PipelineError;
use crate::geometry::{GeometryEngine, PrecomputedEngine};
use crate::release::{ReleaseCommitter, ReleaseFiles};
use crate::stage::{Disposition, Outcome, Stage};
use crate::stages::loops::{self, LOOP_TYPES};

pub const NAME: &str = "motifs.release";
pub const DEPENDENCIES: &[&str] = &[loops::NAME];

/// Loop-order CSV staged by the clustering run.
pub const LOOP_ORDER_FILE: &str = "MotifLoopOrder.csv";
/// Loop-position CSV staged by the clustering run.
pub const LOOP_POSITIONS_FILE: &str = "MotifPositions.csv";
/// Mutual-discrepancy CSV staged by the clustering run.
pub const DISCREPANCY_FILE: &str = "MutualDiscrepancy.csv";
/// Relationship graph descriptor staged by the clustering run.
pub const GRAPH_FILE: &str = "Supergroups.graphml";

pub struct ReleaseStage;

impl ReleaseStage {
    fn release_files(&self, ctx: &Context, type_dir: &Path) -> ReleaseFiles {
        let staged = |name: &str| -> Option<PathBuf> {
            let path = type_dir.join(name);
            path.is_file().then_some(path)
        };
        ReleaseFiles {
            loop_order: staged(LOOP_ORDER_FILE),
            loop_positions: staged(LOOP_POSITIONS_FILE),
            discrepancies: staged(DISCREPANCY_FILE),
            mat_source: Some(type_dir.to_path_buf()),
            mat_destination: Some(ctx.config.locations.mat_destination.clone()),
            diagram_source: Some(ctx.config.locations.diagram_source.clone()),
            diagram_destination: Some(ctx.config.locations.diagram_destination.clone()),
            graph_descriptor: Some(type_dir.join(GRAPH_FILE)),
        }
    }
}

impl Stage for ReleaseStage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dependencies(&self) -> &'static [&'static str] {
        DEPENDENCIES
    }

    fn disposition(&self) -> Disposition {
        Disposition::Mass
    }

    fn is_missing(&self, _ctx: &Context, _entry: &str) -> Result<bool, PipelineError> {
        // Each run that has staged clustering results produces a release.
        Ok(true)
    }

    fn process_all(&self, ctx: &Context, _entries: &[String]) -> Result<Outcome, PipelineError> {
        let engine = PrecomputedEngine;
        let committer = ReleaseCommitter::new(ctx);
        let mode = ctx.config.release_mode("motifs");
        let mut committed = 0usize;

        for &motif_type in LOOP_TYPES {
            let type_dir = ctx.config.locations.search_dir.join(motif_type);
            if !type_dir.is_dir() {
                tracing::debug!(motif_type, "No clustering results staged");
                continue;
            }

            let candidate_csv = engine.cluster(&type_dir)?.into_result()?;
            let candidate = MotifCollection::from_csv(&candidate_csv)?;
            let files = self.release_files(ctx, &type_dir);

            let summary = committer.commit(
                &candidate,
                motif_type,
                mode,
                "Automated atlas update",
                &files,
            )?;
            tracing::info!(
                motif_type,
                release_id = summary.release_id,
                added = summary.added_groups.len(),
                updated = summary.updated_groups.len(),
                same = summary.same_groups.len(),
                removed = summary.removed_groups.len(),
                "Release complete"
            );
            committed += 1;
        }

        if committed == 0 {
            return Ok(Outcome::skipped("no candidate groupings staged"));
        }
        Ok(Outcome::Done)
    }
}
