//! Loop extraction loader.
//!
//! Loads the loops observed in each structure from the staged extraction
//! CSV into `all_loops`. Simple per-entry loader: presence and removal are
//! derived from the `all_loops` table.

use std::path::PathBuf;

use rma_db::LoopInfo;

use crate::context::Context;
use crate::errors::PipelineError;
use crate::stage::{run_loader, Outcome, Stage};
use crate::stages::units;

pub const NAME: &str = "loops.extractor";
pub const DEPENDENCIES: &[&str] = &[units::NAME];

/// Loop types the atlas tracks.
pub const LOOP_TYPES: &[&str] = &["IL", "HL", "JL"];

pub struct ExtractorLoader;

impl ExtractorLoader {
    fn staged_file(&self, ctx: &Context, entry: &str) -> PathBuf {
        ctx.config.locations.loops_dir.join(format!("{entry}.csv"))
    }

    /// Parse the staged loop CSV: `loop_id, type, ordinal, length,
    /// sequence, r_sequence, nwc_sequence, unit_ids`, no header; the unit
    /// id list is one quoted comma-joined field.
    fn data(&self, ctx: &Context, entry: &str) -> Result<Vec<LoopInfo>, PipelineError> {
        let path = self.staged_file(ctx, entry);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .quote(b'"')
            .from_path(&path)
            .map_err(|e| PipelineError::csv(&path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::csv(&path, e))?;
            let get = |index: usize| -> Result<&str, PipelineError> {
                record
                    .get(index)
                    .ok_or_else(|| PipelineError::csv(&path, format!("missing column {index}")))
            };
            let loop_type = get(1)?.to_string();
            if !LOOP_TYPES.contains(&loop_type.as_str()) {
                return Err(PipelineError::csv(
                    &path,
                    format!("unknown loop type `{loop_type}`"),
                ));
            }
            let numeric = |raw: &str| -> Result<i64, PipelineError> {
                raw.trim()
                    .parse()
                    .map_err(|_| PipelineError::csv(&path, format!("`{raw}` is not an integer")))
            };
            rows.push(LoopInfo {
                loop_id: get(0)?.to_string(),
                loop_type,
                pdb_id: entry.to_string(),
                ordinal: numeric(get(2)?)?,
                length: numeric(get(3)?)?,
                sequence: get(4)?.to_string(),
                r_sequence: get(5)?.to_string(),
                nwc_sequence: get(6)?.to_string(),
                unit_ids: get(7)?.to_string(),
            });
        }
        Ok(rows)
    }
}

impl Stage for ExtractorLoader {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dependencies(&self) -> &'static [&'static str] {
        DEPENDENCIES
    }

    fn is_missing(&self, ctx: &Context, entry: &str) -> Result<bool, PipelineError> {
        let present = ctx
            .store
            .with_session(|session| session.has_loops(entry))?;
        Ok(!present)
    }

    fn process(&self, ctx: &Context, entry: &str) -> Result<Outcome, PipelineError> {
        if !self.staged_file(ctx, entry).is_file() {
            return Ok(Outcome::skipped(format!(
                "no staged loop file for {entry}"
            )));
        }
        run_loader(
            ctx,
            NAME,
            entry,
            // Structures without loops are legitimate.
            true,
            |ctx| self.remove(ctx, entry),
            || self.data(ctx, entry),
            |session, row| session.upsert_loop(row),
        )
    }

    fn remove(&self, ctx: &Context, entry: &str) -> Result<(), PipelineError> {
        ctx.store
            .with_session(|session| session.delete_loops(entry))?;
        Ok(())
    }
}
