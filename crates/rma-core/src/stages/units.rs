//! Per-residue unit loader.
//!
//! Simple per-entry loader over `unit_info`: presence and removal are both
//! derived from that one table. Units come from the staged per-structure
//! CSV; a structure without a staged file is skipped with a reason.

use std::path::PathBuf;

use rma_db::UnitInfo;

use crate::context::Context;
use crate::errors::PipelineError;
use crate::stage::{run_loader, Outcome, Stage};
use crate::stages::pdbs;

pub const NAME: &str = "units.info";
pub const DEPENDENCIES: &[&str] = &[pdbs::NAME];

pub struct InfoLoader;

impl InfoLoader {
    fn staged_file(&self, ctx: &Context, entry: &str) -> PathBuf {
        ctx.config.locations.units_dir.join(format!("{entry}.csv"))
    }

    /// Parse the staged unit CSV: `unit_id, model, chain, unit, number,
    /// alt_id, ins_code, sym_op, chain_index`, no header.
    fn data(&self, ctx: &Context, entry: &str) -> Result<Vec<UnitInfo>, PipelineError> {
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
            let number: i64 = get(4)?
                .trim()
                .parse()
                .map_err(|_| PipelineError::csv(&path, "residue number is not an integer"))?;
            let chain_index = match get(8)?.trim() {
                "" => None,
                raw => Some(raw.parse::<i64>().map_err(|_| {
                    PipelineError::csv(&path, "chain index is not an integer")
                })?),
            };
            let optional = |raw: &str| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            };
            rows.push(UnitInfo {
                unit_id: get(0)?.to_string(),
                pdb_id: entry.to_string(),
                model: get(1)?
                    .trim()
                    .parse()
                    .map_err(|_| PipelineError::csv(&path, "model is not an integer"))?,
                chain: get(2)?.to_string(),
                unit: get(3)?.to_string(),
                number,
                alt_id: optional(get(5)?),
                ins_code: optional(get(6)?),
                sym_op: get(7)?.to_string(),
                chain_index,
            });
        }
        Ok(rows)
    }
}

impl Stage for InfoLoader {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dependencies(&self) -> &'static [&'static str] {
        DEPENDENCIES
    }

    fn is_missing(&self, ctx: &Context, entry: &str) -> Result<bool, PipelineError> {
        let present = ctx
            .store
            .with_session(|session| session.has_units(entry))?;
        Ok(!present)
    }

    fn process(&self, ctx: &Context, entry: &str) -> Result<Outcome, PipelineError> {
        if !self.staged_file(ctx, entry).is_file() {
            return Ok(Outcome::skipped(format!(
                "no staged unit file for {entry}"
            )));
        }
        run_loader(
            ctx,
            NAME,
            entry,
            false,
            |ctx| self.remove(ctx, entry),
            || self.data(ctx, entry),
            |session, row| session.insert_unit(row),
        )
    }

    fn remove(&self, ctx: &Context, entry: &str) -> Result<(), PipelineError> {
        ctx.store
            .with_session(|session| session.delete_units(entry))?;
        Ok(())
    }
}
