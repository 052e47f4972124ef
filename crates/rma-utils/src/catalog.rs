//! Archive catalog access.
//!
//! [`ArchiveCatalog`] is the contract the pipeline sees: a listing of the
//! structures the archive currently carries, plus per-entry metadata. The
//! live HTTP/FTP endpoints sit behind this trait; [`FileCatalog`] is the
//! file-backed implementation used by bootstrap runs and tests, and
//! [`RetryingCatalog`] decorates any catalog with the pipeline's bounded
//! retry policy.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::retry::{with_retries, CATALOG_ATTEMPTS, QUERY_ATTEMPTS};
use crate::UtilsError;

/// One catalog entry, as reported by the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Uppercase structure code.
    pub pdb_id: String,
    /// Structure title.
    #[serde(default)]
    pub title: Option<String>,
    /// Experimental technique.
    #[serde(default)]
    pub experimental_technique: Option<String>,
    /// Resolution in angstroms.
    #[serde(default)]
    pub resolution: Option<f64>,
    /// Archive release date.
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Read access to the structure archive.
pub trait ArchiveCatalog {
    /// The codes of all structures the archive currently carries.
    fn current_entries(&self) -> Result<Vec<String>, UtilsError>;

    /// Metadata for one structure.
    fn entry_info(&self, pdb: &str) -> Result<CatalogRecord, UtilsError>;
}

/// Catalog backed by a JSON file containing an array of [`CatalogRecord`]s.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn records(&self) -> Result<Vec<CatalogRecord>, UtilsError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| UtilsError::CatalogRead(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| UtilsError::CatalogParse(format!("{}: {e}", self.path.display())))
    }
}

impl ArchiveCatalog for FileCatalog {
    fn current_entries(&self) -> Result<Vec<String>, UtilsError> {
        let mut entries: Vec<String> = self
            .records()?
            .into_iter()
            .map(|record| record.pdb_id.to_uppercase())
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }

    fn entry_info(&self, pdb: &str) -> Result<CatalogRecord, UtilsError> {
        let wanted = pdb.to_uppercase();
        self.records()?
            .into_iter()
            .find(|record| record.pdb_id.eq_ignore_ascii_case(&wanted))
            .ok_or(UtilsError::UnknownEntry(wanted))
    }
}

/// Decorator applying the pipeline retry policy to any catalog: listings get
/// the long budget, per-entry queries the short one.
pub struct RetryingCatalog<C> {
    inner: C,
}

impl<C: ArchiveCatalog> RetryingCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: ArchiveCatalog> ArchiveCatalog for RetryingCatalog<C> {
    fn current_entries(&self) -> Result<Vec<String>, UtilsError> {
        with_retries("catalog listing", CATALOG_ATTEMPTS, || {
            self.inner.current_entries()
        })
    }

    fn entry_info(&self, pdb: &str) -> Result<CatalogRecord, UtilsError> {
        with_retries("entry query", QUERY_ATTEMPTS, || self.inner.entry_info(pdb))
    }
}
