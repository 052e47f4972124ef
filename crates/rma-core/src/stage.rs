//! The stage protocol shared by every unit of pipeline work.
//!
//! A stage declares its name, its dependencies, and how the executor should
//! drive it: per entry or in one mass call. A stage opts out of an entry by
//! returning [`Outcome::Skipped`] with a reason; the executor logs it and
//! moves on. Anything that should abort the entry (or, with
//! `stop_on_failure`, the whole run) is an error.
//!
//! Loaders and exporters are not separate traits: they are stages whose
//! `process` leans on the helpers in this module. A "simple" loader pairs
//! its `is_missing`/`remove` with the has/delete helpers of a single table
//! in the store; a mass loader reports [`Disposition::Mass`] and implements
//! `process_all`. Containers never implement [`Stage`] at all; the planner
//! expands them away before execution.

use std::fs;
use std::path::Path;

use chrono::Duration;

use rma_db::Session;

use crate::context::Context;
use crate::errors::PipelineError;

/// Maximum number of rows written per transaction commit.
pub const INSERT_MAX: usize = 1000;

/// What processing one entry (or one mass call) produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stage did its work.
    Done,
    /// The stage opted out. Always carries the reason, which is logged.
    Skipped {
        /// Why the stage opted out.
        reason: String,
    },
}

impl Outcome {
    /// Build a skip outcome.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// How the executor drives a stage over its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// One `process` call per entry, with per-entry recovery.
    PerEntry,
    /// One `process_all` call over the whole collection.
    Mass,
}

/// A unit of pipeline work.
pub trait Stage {
    /// Dotted stage name, unique per run plan.
    fn name(&self) -> &'static str;

    /// Names of the stages this stage depends on.
    fn dependencies(&self) -> &'static [&'static str];

    /// Whether a failure of one entry aborts the whole run plan.
    fn stop_on_failure(&self) -> bool {
        true
    }

    /// Maximum age of a completion mark before the entry is refreshed.
    /// `None` means the stage never refreshes based on time.
    fn update_gap(&self) -> Option<Duration> {
        None
    }

    /// Whether completion is recorded in the analysis-status table.
    fn mark(&self) -> bool {
        true
    }

    /// How the executor drives this stage.
    fn disposition(&self) -> Disposition {
        Disposition::PerEntry
    }

    /// Transform user input into the list of entries to process. The
    /// default canonicalizes entry ids to uppercase.
    fn to_process(
        &self,
        ctx: &Context,
        given: &[String],
    ) -> Result<Vec<String>, PipelineError> {
        let _ = ctx;
        Ok(given.iter().map(|entry| entry.to_uppercase()).collect())
    }

    /// Whether the stage has no data yet for the entry. Missing data forces
    /// processing.
    fn is_missing(&self, ctx: &Context, entry: &str) -> Result<bool, PipelineError>;

    /// Process one entry. Only called for [`Disposition::PerEntry`] stages.
    fn process(&self, ctx: &Context, entry: &str) -> Result<Outcome, PipelineError> {
        let _ = (ctx, entry);
        Err(PipelineError::invalid_state(format!(
            "Stage `{}` does not process single entries",
            self.name()
        )))
    }

    /// Process the whole collection at once. Only called for
    /// [`Disposition::Mass`] stages.
    fn process_all(&self, ctx: &Context, entries: &[String]) -> Result<Outcome, PipelineError> {
        let _ = (ctx, entries);
        Err(PipelineError::invalid_state(format!(
            "Stage `{}` does not process in mass",
            self.name()
        )))
    }

    /// Clean up any partial write for the entry. Called before the run
    /// aborts when `stop_on_failure` is set. Must be safe to call when
    /// nothing was written.
    fn remove(&self, ctx: &Context, entry: &str) -> Result<(), PipelineError> {
        let _ = (ctx, entry);
        Ok(())
    }
}

/// Drive one per-entry loader step: clear old rows on a forced recompute,
/// compute the data, enforce `allow_no_data`, and store in chunks.
pub fn run_loader<R>(
    ctx: &Context,
    stage_name: &str,
    entry: &str,
    allow_no_data: bool,
    remove_old: impl FnOnce(&Context) -> Result<(), PipelineError>,
    data: impl FnOnce() -> Result<Vec<R>, PipelineError>,
    write: impl Fn(&Session<'_>, &R) -> rma_db::DbResult<()>,
) -> Result<Outcome, PipelineError> {
    if ctx.should_recompute(stage_name) {
        if ctx.dry_run {
            tracing::debug!(entry, "Skipping removal in dry run");
        } else {
            tracing::debug!(entry, "Removing old data");
            remove_old(ctx)?;
        }
    }

    let rows = data()?;
    if rows.is_empty() {
        if allow_no_data {
            tracing::warn!(entry, stage = stage_name, "No data produced");
            return Ok(Outcome::Done);
        }
        return Err(PipelineError::invalid_state(format!(
            "Stage {stage_name} produced no data processing {entry}"
        )));
    }

    store_chunked(ctx, stage_name, &rows, write)?;
    Ok(Outcome::Done)
}

/// Store rows in chunks of at most [`INSERT_MAX`] per transaction commit.
/// In dry-run mode nothing is written; the attempt is logged instead.
pub fn store_chunked<R>(
    ctx: &Context,
    stage_name: &str,
    rows: &[R],
    write: impl Fn(&Session<'_>, &R) -> rma_db::DbResult<()>,
) -> Result<(), PipelineError> {
    if ctx.dry_run {
        tracing::debug!(stage = stage_name, rows = rows.len(), "Dry run, not storing");
        return Ok(());
    }

    for chunk in rows.chunks(INSERT_MAX) {
        ctx.store
            .with_session(|session| -> rma_db::DbResult<()> {
                for row in chunk {
                    write(session, row)?;
                }
                Ok(())
            })?;
    }
    tracing::debug!(stage = stage_name, rows = rows.len(), "Done committing");
    Ok(())
}

/// Write exporter output to its computed filename, creating parent
/// directories. Dry runs log instead of writing.
pub fn write_export(
    ctx: &Context,
    stage_name: &str,
    path: &Path,
    text: &str,
) -> Result<(), PipelineError> {
    if ctx.dry_run {
        tracing::debug!(stage = stage_name, path = %path.display(), "Dry run, not writing");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
