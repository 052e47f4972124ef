//! The stage executor.
//!
//! Drives each stage of a plan over the entry collection: canonicalizes the
//! input, decides per entry whether processing is needed (deny set, forced
//! recompute, time gap, missing data), isolates per-entry failures, runs the
//! compensating `remove` before aborting when `stop_on_failure` is set, and
//! records completion marks. Mass stages get the whole collection in one
//! call and completion marks for every input on success.

use chrono::Utc;

use rma_db::AnalysisStatus;

use crate::context::Context;
use crate::errors::PipelineError;
use crate::registry::{self, StageSpec};
use crate::stage::{Disposition, Outcome, Stage};

/// Entries that are never processed. 4V3P is a very large virus file.
pub const DENY: &[&str] = &["4V3P"];

/// Executes a resolved plan against one run context.
pub struct Executor<'a> {
    ctx: &'a Context,
}

impl<'a> Executor<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Run every stage of the plan, in order, over the given entries.
    pub fn run(&self, plan: &[&'static StageSpec], entries: &[String]) -> Result<(), PipelineError> {
        tracing::debug!(
            stages = %plan.iter().map(|s| s.name).collect::<Vec<_>>().join(", "),
            "Running stages"
        );
        for spec in plan {
            let stage = registry::create(spec.name)?;
            tracing::info!("Running stage: {}", spec.name);
            if let Err(err) = self.run_stage(stage.as_ref(), entries) {
                tracing::error!(stage = spec.name, "Uncaught error in stage: {err}");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Run one stage over the given input.
    pub fn run_stage(&self, stage: &dyn Stage, given: &[String]) -> Result<(), PipelineError> {
        let entries = stage.to_process(self.ctx, given)?;
        if entries.is_empty() {
            tracing::error!(stage = stage.name(), "Nothing to process");
            return Err(PipelineError::invalid_state("Nothing to process"));
        }

        match stage.disposition() {
            Disposition::PerEntry => self.run_per_entry(stage, &entries),
            Disposition::Mass => self.run_mass(stage, &entries),
        }
    }

    fn run_per_entry(&self, stage: &dyn Stage, entries: &[String]) -> Result<(), PipelineError> {
        let total = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            tracing::info!("Processing {}: {}/{}", entry, index + 1, total);

            if DENY.contains(&entry.as_str()) {
                tracing::warn!("Hardcoded skipping of {entry}");
                continue;
            }

            let step = || -> Result<Option<Outcome>, PipelineError> {
                if !self.should_process(stage, entry)? {
                    return Ok(None);
                }
                stage.process(self.ctx, entry).map(Some)
            };

            match step() {
                Ok(None) => {
                    tracing::debug!("No need to process {entry}");
                }
                Ok(Some(Outcome::Skipped { reason })) => {
                    tracing::warn!("Skipping entry {entry}. Reason: {reason}");
                }
                Ok(Some(Outcome::Done)) => {
                    if stage.mark() {
                        self.mark_processed(stage, entry)?;
                    }
                }
                Err(err) => {
                    tracing::error!("Error raised in processing of {entry}: {err}");
                    if stage.stop_on_failure() {
                        if let Err(cleanup) = stage.remove(self.ctx, entry) {
                            tracing::error!("Cleanup of {entry} also failed: {cleanup}");
                        }
                        return Err(PipelineError::stage_failed(stage.name()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Mass stages are a single transaction over the entire collection.
    fn run_mass(&self, stage: &dyn Stage, entries: &[String]) -> Result<(), PipelineError> {
        tracing::info!("Processing all {} entries", entries.len());

        match stage.process_all(self.ctx, entries) {
            Ok(Outcome::Done) => {
                if stage.mark() {
                    for entry in entries {
                        self.mark_processed(stage, entry)?;
                    }
                }
                Ok(())
            }
            Ok(Outcome::Skipped { reason }) => {
                tracing::warn!("Skipping processing of all entries. Reason: {reason}");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Error raised processing all entries: {err}");
                if stage.stop_on_failure() {
                    Err(PipelineError::stage_failed(stage.name()))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Whether the entry needs processing: forced recompute, stale
    /// completion mark, or missing data. Otherwise it is skipped.
    fn should_process(&self, stage: &dyn Stage, entry: &str) -> Result<bool, PipelineError> {
        if self.ctx.should_recompute(stage.name()) {
            tracing::debug!("Performing a forced recompute");
            return Ok(true);
        }
        if self.been_long_enough(stage, entry)? {
            tracing::debug!("Time gap for {entry} too large, recomputing");
            return Ok(true);
        }
        if stage.is_missing(self.ctx, entry)? {
            tracing::debug!("Missing data from {entry}. Will recompute");
            return Ok(true);
        }
        Ok(false)
    }

    /// Whether the completion mark for (entry, stage) is older than the
    /// stage's update gap. Stages without a gap never refresh on time; a
    /// mark in the far future counts as stale too.
    fn been_long_enough(&self, stage: &dyn Stage, entry: &str) -> Result<bool, PipelineError> {
        let Some(gap) = stage.update_gap() else {
            return Ok(false);
        };
        if self.ctx.ignore_time {
            return Ok(false);
        }
        let last = self
            .ctx
            .store
            .with_session(|session| session.analysis_status(entry, stage.name()))?;
        Ok(match last {
            None => true,
            Some(time) => (Utc::now() - time).abs() > gap,
        })
    }

    fn mark_processed(&self, stage: &dyn Stage, entry: &str) -> Result<(), PipelineError> {
        if self.ctx.dry_run {
            tracing::debug!("Marking {entry} as done");
        } else {
            self.ctx.store.with_session(|session| {
                session.mark_analysis_status(&AnalysisStatus {
                    pdb: entry.to_string(),
                    stage: stage.name().to_string(),
                    time: Utc::now(),
                })
            })?;
        }
        tracing::info!("Updated {} status for pdb {}", stage.name(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::cell::RefCell;
    use std::sync::Arc;

    use chrono::Duration;
    use rma_db::Store;

    fn context() -> Context {
        let store = Store::in_memory().expect("open store");
        Context::with_seed(Arc::new(Config::default()), store, Some(1))
    }

    /// Minimal per-entry stage with scriptable behavior.
    struct ScriptedStage {
        stop_on_failure: bool,
        update_gap: Option<Duration>,
        missing: RefCell<bool>,
        fail: bool,
        skip: bool,
        processed: RefCell<Vec<String>>,
        removed: RefCell<Vec<String>>,
    }

    impl ScriptedStage {
        fn new() -> Self {
            Self {
                stop_on_failure: true,
                update_gap: None,
                missing: RefCell::new(true),
                fail: false,
                skip: false,
                processed: RefCell::new(Vec::new()),
                removed: RefCell::new(Vec::new()),
            }
        }
    }

    impl Stage for ScriptedStage {
        fn name(&self) -> &'static str {
            "test.scripted"
        }

        fn dependencies(&self) -> &'static [&'static str] {
            &[]
        }

        fn stop_on_failure(&self) -> bool {
            self.stop_on_failure
        }

        fn update_gap(&self) -> Option<Duration> {
            self.update_gap
        }

        fn is_missing(&self, _ctx: &Context, _entry: &str) -> Result<bool, PipelineError> {
            Ok(*self.missing.borrow())
        }

        fn process(&self, _ctx: &Context, entry: &str) -> Result<Outcome, PipelineError> {
            if self.fail {
                return Err(PipelineError::invalid_state("scripted failure"));
            }
            if self.skip {
                return Ok(Outcome::skipped("scripted skip"));
            }
            self.processed.borrow_mut().push(entry.to_string());
            *self.missing.borrow_mut() = false;
            Ok(Outcome::Done)
        }

        fn remove(&self, _ctx: &Context, entry: &str) -> Result<(), PipelineError> {
            self.removed.borrow_mut().push(entry.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_entries_are_uppercased() {
        let ctx = context();
        let stage = ScriptedStage::new();
        Executor::new(&ctx)
            .run_stage(&stage, &["1s72".to_string()])
            .expect("run");
        assert_eq!(*stage.processed.borrow(), vec!["1S72"]);
    }

    #[test]
    fn test_empty_input_is_invalid_state() {
        let ctx = context();
        let stage = ScriptedStage::new();
        let result = Executor::new(&ctx).run_stage(&stage, &[]);
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));
    }

    #[test]
    fn test_deny_set_entry_never_processed() {
        let ctx = context();
        let stage = ScriptedStage::new();
        Executor::new(&ctx)
            .run_stage(&stage, &["4V3P".to_string(), "1S72".to_string()])
            .expect("run");
        assert_eq!(*stage.processed.borrow(), vec!["1S72"]);
    }

    #[test]
    fn test_rerun_with_mark_intact_performs_zero_writes() {
        let ctx = context();
        let stage = ScriptedStage::new();
        let executor = Executor::new(&ctx);
        let entries = vec!["1S72".to_string()];

        executor.run_stage(&stage, &entries).expect("first run");
        assert_eq!(stage.processed.borrow().len(), 1);

        let marked = ctx
            .store
            .with_session(|session| session.analysis_status("1S72", "test.scripted"))
            .expect("query");
        assert!(marked.is_some());

        executor.run_stage(&stage, &entries).expect("second run");
        assert_eq!(stage.processed.borrow().len(), 1, "no second process call");
    }

    #[test]
    fn test_stale_mark_forces_reprocess() {
        let ctx = context();
        let mut stage = ScriptedStage::new();
        stage.update_gap = Some(Duration::days(1));
        *stage.missing.borrow_mut() = false;

        ctx.store
            .with_session(|session| {
                session.mark_analysis_status(&AnalysisStatus {
                    pdb: "1S72".into(),
                    stage: "test.scripted".into(),
                    time: Utc::now() - Duration::days(30),
                })
            })
            .expect("seed status");

        Executor::new(&ctx)
            .run_stage(&stage, &["1S72".to_string()])
            .expect("run");
        assert_eq!(stage.processed.borrow().len(), 1);
    }

    #[test]
    fn test_ignore_time_suppresses_refresh() {
        let mut ctx = context();
        ctx.ignore_time = true;
        let mut stage = ScriptedStage::new();
        stage.update_gap = Some(Duration::days(1));
        *stage.missing.borrow_mut() = false;

        ctx.store
            .with_session(|session| {
                session.mark_analysis_status(&AnalysisStatus {
                    pdb: "1S72".into(),
                    stage: "test.scripted".into(),
                    time: Utc::now() - Duration::days(30),
                })
            })
            .expect("seed status");

        Executor::new(&ctx)
            .run_stage(&stage, &["1S72".to_string()])
            .expect("run");
        assert!(stage.processed.borrow().is_empty());
    }

    #[test]
    fn test_skip_outcome_continues_without_mark() {
        let ctx = context();
        let mut stage = ScriptedStage::new();
        stage.skip = true;

        Executor::new(&ctx)
            .run_stage(&stage, &["1S72".to_string(), "1J5E".to_string()])
            .expect("run");

        let marked = ctx
            .store
            .with_session(|session| session.analysis_status("1S72", "test.scripted"))
            .expect("query");
        assert!(marked.is_none());
    }

    #[test]
    fn test_stop_on_failure_removes_and_aborts() {
        let ctx = context();
        let mut stage = ScriptedStage::new();
        stage.fail = true;

        let result = Executor::new(&ctx).run_stage(&stage, &["1S72".to_string()]);
        assert!(matches!(result, Err(PipelineError::StageFailed { .. })));
        assert_eq!(*stage.removed.borrow(), vec!["1S72"]);
    }

    #[test]
    fn test_failure_without_stop_continues() {
        let ctx = context();
        let mut stage = ScriptedStage::new();
        stage.fail = true;
        stage.stop_on_failure = false;

        Executor::new(&ctx)
            .run_stage(&stage, &["1S72".to_string(), "1J5E".to_string()])
            .expect("run continues");
        assert!(stage.removed.borrow().is_empty());
    }

    #[test]
    fn test_dry_run_writes_no_marks() {
        let mut ctx = context();
        ctx.dry_run = true;
        let stage = ScriptedStage::new();

        Executor::new(&ctx)
            .run_stage(&stage, &["1S72".to_string()])
            .expect("run");

        let marked = ctx
            .store
            .with_session(|session| session.analysis_status("1S72", "test.scripted"))
            .expect("query");
        assert!(marked.is_none());
    }

    /// Mass stage recording the one call it receives.
    struct ScriptedMass {
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl Stage for ScriptedMass {
        fn name(&self) -> &'static str {
            "test.mass"
        }

        fn dependencies(&self) -> &'static [&'static str] {
            &[]
        }

        fn disposition(&self) -> Disposition {
            Disposition::Mass
        }

        fn is_missing(&self, _ctx: &Context, _entry: &str) -> Result<bool, PipelineError> {
            Ok(true)
        }

        fn process_all(
            &self,
            _ctx: &Context,
            entries: &[String],
        ) -> Result<Outcome, PipelineError> {
            self.calls.borrow_mut().push(entries.to_vec());
            Ok(Outcome::Done)
        }
    }

    #[test]
    fn test_mass_stage_gets_one_call_and_marks_every_entry() {
        let ctx = context();
        let stage = ScriptedMass {
            calls: RefCell::new(Vec::new()),
        };

        Executor::new(&ctx)
            .run_stage(&stage, &["1s72".to_string(), "1j5e".to_string()])
            .expect("run");

        assert_eq!(stage.calls.borrow().len(), 1);
        assert_eq!(stage.calls.borrow()[0], vec!["1S72", "1J5E"]);

        for entry in ["1S72", "1J5E"] {
            let marked = ctx
                .store
                .with_session(|session| session.analysis_status(entry, "test.mass"))
                .expect("query");
            assert!(marked.is_some(), "{entry} should be marked");
        }
    }
}
