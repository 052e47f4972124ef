//! Loop exporter.
//!
//! Writes one CSV per structure summarizing its loops. "Missing" means the
//! output file does not exist, so deleting an export is enough to have it
//! regenerated on the next run.

use std::path::PathBuf;

use crate::context::Context;
use crate::errors::PipelineError;
use crate::stage::{write_export, Outcome, Stage};
use crate::stages::loops;

pub const NAME: &str = "export.loops";
pub const DEPENDENCIES: &[&str] = &[loops::NAME];

pub struct LoopsExporter;

impl LoopsExporter {
    fn filename(&self, ctx: &Context, entry: &str) -> PathBuf {
        ctx.config.locations.export_dir.join(format!("{entry}.csv"))
    }

    fn text(&self, ctx: &Context, entry: &str) -> Result<String, PipelineError> {
        let loops = ctx
            .store
            .with_session(|session| session.loops_for_pdb(entry))?;
        let mut out = String::new();
        for info in loops {
            out.push_str(&format!(
                "{},{},{},{},\"{}\"\n",
                info.loop_id, info.loop_type, info.length, info.sequence, info.unit_ids
            ));
        }
        Ok(out)
    }
}

impl Stage for LoopsExporter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dependencies(&self) -> &'static [&'static str] {
        DEPENDENCIES
    }

    fn mark(&self) -> bool {
        // Exports are rebuilt from the output file's presence, not from
        // analysis-status rows.
        false
    }

    fn is_missing(&self, ctx: &Context, entry: &str) -> Result<bool, PipelineError> {
        Ok(!self.filename(ctx, entry).exists())
    }

    fn process(&self, ctx: &Context, entry: &str) -> Result<Outcome, PipelineError> {
        let text = self.text(ctx, entry)?;
        if text.is_empty() {
            return Ok(Outcome::skipped(format!("no loops to export for {entry}")));
        }
        write_export(ctx, NAME, &self.filename(ctx, entry), &text)?;
        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::Executor;
    use std::fs;
    use std::sync::Arc;

    use rma_db::{LoopInfo, Store};

    fn context_with_export_dir() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = Config::default();
        config.locations.export_dir = dir.path().join("export");
        let store = Store::in_memory().expect("open store");
        let ctx = Context::with_seed(Arc::new(config), store, Some(1));
        (dir, ctx)
    }

    fn seed_loop(ctx: &Context) {
        ctx.store
            .with_session(|session| {
                session.insert_loop(&LoopInfo {
                    loop_id: "IL_1S72_001".into(),
                    loop_type: "IL".into(),
                    pdb_id: "1S72".into(),
                    ordinal: 1,
                    length: 4,
                    sequence: "CAGG".into(),
                    r_sequence: "GGAC".into(),
                    nwc_sequence: "AG".into(),
                    unit_ids: "u1,u2,u3,u4".into(),
                })
            })
            .expect("seed loop");
    }

    #[test]
    fn test_exports_loops_to_file() {
        let (dir, ctx) = context_with_export_dir();
        seed_loop(&ctx);

        Executor::new(&ctx)
            .run_stage(&LoopsExporter, &["1s72".to_string()])
            .expect("run");

        let exported =
            fs::read_to_string(dir.path().join("export").join("1S72.csv")).expect("read export");
        assert!(exported.contains("IL_1S72_001,IL,4,CAGG"));
    }

    #[test]
    fn test_structure_without_loops_is_skipped() {
        let (dir, ctx) = context_with_export_dir();

        Executor::new(&ctx)
            .run_stage(&LoopsExporter, &["1S72".to_string()])
            .expect("run");

        assert!(!dir.path().join("export").join("1S72.csv").exists());
    }

    #[test]
    fn test_existing_export_is_not_rewritten() {
        let (dir, ctx) = context_with_export_dir();
        seed_loop(&ctx);
        let path = dir.path().join("export").join("1S72.csv");
        fs::create_dir_all(path.parent().expect("parent")).expect("create export dir");
        fs::write(&path, "sentinel\n").expect("write sentinel");

        Executor::new(&ctx)
            .run_stage(&LoopsExporter, &["1S72".to_string()])
            .expect("run");

        let content = fs::read_to_string(&path).expect("read export");
        assert_eq!(content, "sentinel\n");
    }
}
