//! # rma-core
//!
//! Engine library for the RNA 3D Motif Atlas update pipeline.
//!
//! The pipeline ingests structure metadata and staged extraction results,
//! derives per-residue and per-loop information, and publishes versioned
//! motif releases with change summaries relating each release to its
//! predecessor.
//!
//! ## Main Types
//!
//! - [`Context`] – configuration + store + run flags, threaded everywhere
//! - [`Stage`] – the protocol every unit of pipeline work implements
//! - [`Executor`] – drives a resolved plan with per-entry recovery
//! - [`MotifCollection`] – immutable (loop → group) snapshot
//! - [`ReleaseCommitter`] – turns a candidate collection into a release
//! - [`PipelineError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`config`] – YAML run configuration
//! - [`registry`] – stage name → spec/constructor, fails closed
//! - [`planner`] – dependency resolution and topological ordering
//! - [`executor`] – the stage executor
//! - [`stage`] – the stage protocol and loader/exporter helpers
//! - [`collection`] / [`merger`] / [`release`] – the release subsystem
//! - [`geometry`] – external clustering engine boundary
//! - [`stages`] – the concrete stages
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rma_core::{planner, Config, Context, Executor};
//! use rma_db::Store;
//!
//! let config = Arc::new(Config::from_path("atlas.yaml".as_ref())?);
//! let store = Store::open(&config.db.path)?;
//! let ctx = Context::with_seed(config, store, Some(1));
//!
//! let plan = planner::plan("units.info", &Default::default(), false)?;
//! Executor::new(&ctx).run(&plan, &["1S72".to_string()])?;
//! ```

// Modules
pub mod collection;
pub mod config;
pub mod context;
pub mod errors;
pub mod executor;
pub mod geometry;
pub mod merger;
pub mod planner;
pub mod registry;
pub mod release;
pub mod stage;
pub mod stages;

// Re-exports for convenience
pub use collection::MotifCollection;
pub use config::{Config, ReleaseMode};
pub use context::Context;
pub use errors::PipelineError;
pub use executor::{Executor, DENY};
pub use geometry::{ClusterOutput, GeometryEngine, PrecomputedEngine};
pub use merger::{merge, Classification, GroupDecision, MergeOutcome, MIN_OVERLAP};
pub use registry::{StageSpec, SPECS};
pub use release::{
    draw_handle, next_release_id, parse_motif_id, CommitSummary, ReleaseCommitter, ReleaseFiles,
    FIRST_RELEASE_ID,
};
pub use stage::{Disposition, Outcome, Stage, INSERT_MAX};
