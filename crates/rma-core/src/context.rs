//! The run context threaded through planner, executor and stages.
//!
//! There are no process-wide singletons: the CLI builds one [`Context`] per
//! run and passes it by reference. It carries the read-only configuration,
//! the store handle, the RNG used for handle allocation, and the per-run
//! flags that influence recompute decisions.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rma_db::Store;

use crate::config::Config;

/// Shared state for one pipeline run.
pub struct Context {
    /// Read-only configuration.
    pub config: Arc<Config>,
    /// The atlas store; every unit of work takes a fresh session from it.
    pub store: Store,
    /// RNG used for motif handle allocation. Seeded when `--seed` is given,
    /// which makes test runs deterministic.
    rng: RefCell<StdRng>,
    /// When set, all writes are replaced by log statements.
    pub dry_run: bool,
    /// Stage names forced to recompute for this run.
    pub recalculate: BTreeSet<String>,
    /// When set, `update_gap` checks are skipped.
    pub ignore_time: bool,
}

impl Context {
    /// Build a context with an unseeded RNG.
    pub fn new(config: Arc<Config>, store: Store) -> Self {
        Self::with_seed(config, store, None)
    }

    /// Build a context, seeding the RNG when a seed is given.
    pub fn with_seed(config: Arc<Config>, store: Store, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => rand::make_rng(),
        };
        Self {
            config,
            store,
            rng: RefCell::new(rng),
            dry_run: false,
            recalculate: BTreeSet::new(),
            ignore_time: false,
        }
    }

    /// Run `f` with mutable access to the run RNG.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        f(&mut self.rng.borrow_mut())
    }

    /// Whether the given stage must be recomputed: either the run forced it
    /// via `--recalculate` or the configuration carries a recompute toggle.
    pub fn should_recompute(&self, stage: &str) -> bool {
        self.recalculate.contains(stage) || self.config.recompute(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngExt;

    fn context() -> Context {
        let store = Store::in_memory().expect("open store");
        Context::with_seed(Arc::new(Config::default()), store, Some(1))
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = context().with_rng(|rng| rng.random_range(0..100_000u32));
        let b = context().with_rng(|rng| rng.random_range(0..100_000u32));
        assert_eq!(a, b);
    }

    #[test]
    fn test_should_recompute_from_flag_and_config() {
        let mut ctx = context();
        assert!(!ctx.should_recompute("units.info"));

        ctx.recalculate.insert("units.info".to_string());
        assert!(ctx.should_recompute("units.info"));

        let mut config = Config::default();
        config.recompute.insert("loops.extractor".to_string(), true);
        ctx.config = Arc::new(config);
        assert!(ctx.should_recompute("loops.extractor"));
    }
}
