//! # rma-db
//!
//! Persistence layer for the RNA 3D Motif Atlas update pipeline.
//!
//! This crate isolates all SQLite access behind a small, transactional
//! session abstraction so that the pipeline engine in `rma-core` never
//! touches a connection directly:
//!
//! - [`Store`] owns the connection and creates the schema idempotently
//! - [`Session`] is one scoped unit of work: it commits on clean exit and
//!   rolls back on any error
//! - [`records`] holds the typed row structs for every atlas table
//!
//! ## Usage
//!
//! ```ignore
//! use rma_db::Store;
//!
//! let store = Store::open("atlas.db")?;
//! let latest = store.with_session(|session| session.latest_release("IL"))?;
//! ```

pub mod error;
pub mod records;
pub mod schema;
pub mod store;

pub use error::{DbError, DbResult};
pub use records::{
    AnalysisStatus, DiscrepancyRow, LoopInfo, LoopOrderRow, LoopPositionRow, MotifLoopRow,
    MotifRow, ParentRow, PdbInfo, ReleaseDiffRow, ReleaseRow, SetDiffRow, UnitInfo,
};
pub use store::{ReleaseCounts, Session, Store};
