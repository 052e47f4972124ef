//! Utility functions for the atlas pipeline.
//!
//! This crate provides the bounded-retry helper used for all archive access
//! and the [`ArchiveCatalog`](catalog::ArchiveCatalog) contract behind which
//! the live archive endpoints live. It keeps network-shaped concerns out of
//! the engine crate so the pipeline itself stays deterministic and testable.

use thiserror::Error;

pub mod catalog;
pub mod retry;

/// Errors raised by catalog access and retry exhaustion.
#[derive(Debug, Error)]
pub enum UtilsError {
    /// All retry attempts for an operation failed.
    #[error("`{operation}` failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// What was being attempted.
        operation: String,
        /// How many attempts were made.
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
    },

    /// The catalog source could not be read.
    #[error("Failed to read catalog: {0}")]
    CatalogRead(String),

    /// The catalog source could not be parsed.
    #[error("Failed to parse catalog: {0}")]
    CatalogParse(String),

    /// The requested entry does not exist in the catalog.
    #[error("Entry `{0}` not found in catalog")]
    UnknownEntry(String),
}

pub use catalog::{ArchiveCatalog, CatalogRecord, FileCatalog, RetryingCatalog};
pub use retry::{with_retries, CATALOG_ATTEMPTS, QUERY_ATTEMPTS};
