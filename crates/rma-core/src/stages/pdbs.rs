//! Structure-level metadata loader.
//!
//! Mass loader: the archive catalog is queried once for the whole entry
//! collection and the results merge-upserted into `pdb_info`, so rerunning
//! refreshes metadata in place.

use rma_db::PdbInfo;
use rma_utils::{ArchiveCatalog, FileCatalog, RetryingCatalog};

use crate::context::Context;
use crate::errors::PipelineError;
use crate::stage::{store_chunked, Disposition, Outcome, Stage};

pub const NAME: &str = "pdbs.info";
pub const DEPENDENCIES: &[&str] = &[];

pub struct InfoLoader;

impl InfoLoader {
    fn data(&self, ctx: &Context, entries: &[String]) -> Result<Vec<PdbInfo>, PipelineError> {
        let catalog = RetryingCatalog::new(FileCatalog::new(&ctx.config.locations.catalog));
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = catalog.entry_info(entry)?;
            rows.push(PdbInfo {
                pdb_id: record.pdb_id.to_uppercase(),
                title: record.title,
                experimental_technique: record.experimental_technique,
                resolution: record.resolution,
                release_date: record.release_date,
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

    fn disposition(&self) -> Disposition {
        Disposition::Mass
    }

    fn is_missing(&self, _ctx: &Context, _entry: &str) -> Result<bool, PipelineError> {
        // A mass loader never has its data; the whole catalog is refreshed.
        Ok(true)
    }

    fn process_all(&self, ctx: &Context, entries: &[String]) -> Result<Outcome, PipelineError> {
        let rows = self.data(ctx, entries)?;
        if rows.is_empty() {
            return Err(PipelineError::invalid_state("Missing data"));
        }
        store_chunked(ctx, NAME, &rows, |session, row| session.upsert_pdb_info(row))?;
        Ok(Outcome::Done)
    }
}
