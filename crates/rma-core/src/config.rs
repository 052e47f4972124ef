//! Configuration types for the atlas pipeline.
//!
//! One YAML document configures a whole run: where the database lives, which
//! stages are forced to recompute, how release ids advance for each artifact
//! kind, where staged input and output files sit on disk, and how failure
//! reports are mailed.
//!
//! # Example YAML
//!
//! ```yaml
//! db:
//!   path: atlas.db
//! recompute:
//!   units.info: false
//! release_mode:
//!   motifs: minor
//!   nr: major
//! locations:
//!   catalog: staging/catalog.json
//!   units_dir: staging/units
//!   loops_dir: staging/loops
//!   search_dir: staging/search
//!   mat_destination: results/mat
//!   diagram_source: staging/2ds
//!   diagram_destination: results/2ds
//!   export_dir: results/export
//! email:
//!   enabled: false
//! pdbs: [1S72, 1J5E]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// How the next release id is derived from the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseMode {
    /// `MAJOR.MINOR` becomes `(MAJOR+1).0`.
    Major,
    /// `MAJOR.MINOR` becomes `MAJOR.(MINOR+1)`.
    #[default]
    Minor,
}

impl std::fmt::Display for ReleaseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
        }
    }
}

impl std::str::FromStr for ReleaseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            _ => Err(format!("Unknown release mode `{s}`. Use `major` or `minor`.")),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("atlas.db"),
        }
    }
}

/// Filesystem roots for staged inputs and published outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Locations {
    /// JSON catalog standing in for the archive listing.
    pub catalog: PathBuf,
    /// Directory of per-structure unit CSVs (`{PDB}.csv`).
    pub units_dir: PathBuf,
    /// Directory of per-structure loop CSVs (`{PDB}.csv`).
    pub loops_dir: PathBuf,
    /// Root of clustering results; one subdirectory per motif type.
    pub search_dir: PathBuf,
    /// Destination for committed `.mat` files.
    pub mat_destination: PathBuf,
    /// Source directory of 2D diagram `.png` files.
    pub diagram_source: PathBuf,
    /// Destination root for committed 2D diagrams.
    pub diagram_destination: PathBuf,
    /// Directory the loop exporter writes into.
    pub export_dir: PathBuf,
}

/// Failure-report mail settings. The pipeline only records these; the
/// reporting glue that sends mail lives outside the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Whether a report should be sent at all.
    pub enabled: bool,
    /// Mail relay host.
    pub relay: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Recipient addresses.
    pub to: Vec<String>,
}

/// Read-only configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub db: DbConfig,

    /// Per-stage forced-recompute toggles, keyed by dotted stage name.
    pub recompute: BTreeMap<String, bool>,

    /// Release id advancement per artifact kind (`motifs`, `nr`, ...).
    pub release_mode: BTreeMap<String, ReleaseMode>,

    /// Filesystem roots.
    pub locations: Locations,

    /// Failure-report mail settings.
    pub email: EmailConfig,

    /// Structure codes used to seed a test database via `bootstrap`.
    pub pdbs: Vec<String>,
}

impl Config {
    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the file cannot be read
    /// or parsed, and [`PipelineError::InvalidConfiguration`] if a value
    /// fails validation.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidConfig(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            PipelineError::InvalidConfig(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, logging warnings for suspicious values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.db.path.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfiguration {
                message: "db.path is empty".into(),
                hint: "Point db.path at the SQLite database file".into(),
            });
        }
        if self.email.enabled && self.email.to.is_empty() {
            tracing::warn!("email.enabled is set but email.to lists no recipients");
        }
        for pdb in &self.pdbs {
            if pdb.len() != 4 {
                tracing::warn!(pdb = %pdb, "Seed entry does not look like a structure code");
            }
        }
        Ok(())
    }

    /// Whether the configuration forces a recompute for the given stage.
    pub fn recompute(&self, stage: &str) -> bool {
        self.recompute.get(stage).copied().unwrap_or(false)
    }

    /// The release mode for an artifact kind, defaulting to minor.
    pub fn release_mode(&self, kind: &str) -> ReleaseMode {
        self.release_mode.get(kind).copied().unwrap_or_default()
    }
}
