//! The external geometry engine boundary.
//!
//! The clustering computation itself lives outside this crate. The engine
//! is an opaque callable: given a directory it returns the path of the CSV
//! it produced and an error message. A non-empty message is fatal and maps
//! to [`PipelineError::EngineFailed`].

use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

/// Conventional name of the candidate grouping file in a search directory.
pub const MOTIF_LIST_FILE: &str = "MotifList.csv";

/// What one engine invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOutput {
    /// Path of the CSV holding the candidate grouping.
    pub output_csv: PathBuf,
    /// Error message; empty on success.
    pub error: String,
}

impl ClusterOutput {
    /// Surface the engine's error message, if any.
    pub fn into_result(self) -> Result<PathBuf, PipelineError> {
        if self.error.is_empty() {
            Ok(self.output_csv)
        } else {
            Err(PipelineError::EngineFailed {
                message: self.error,
            })
        }
    }
}

/// A clustering engine the release stage can invoke on a directory.
pub trait GeometryEngine {
    /// Run (or locate the results of) clustering for the given directory.
    fn cluster(&self, directory: &Path) -> Result<ClusterOutput, PipelineError>;
}

/// Engine implementation that expects the clustering results to already be
/// staged in the directory, as the batch geometry run leaves them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedEngine;

impl GeometryEngine for PrecomputedEngine {
    fn cluster(&self, directory: &Path) -> Result<ClusterOutput, PipelineError> {
        let output_csv = directory.join(MOTIF_LIST_FILE);
        let error = if output_csv.is_file() {
            String::new()
        } else {
            format!("no clustering output at {}", output_csv.display())
        };
        Ok(ClusterOutput { output_csv, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_precomputed_engine_finds_staged_output() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join(MOTIF_LIST_FILE), "IL_1S72_001,Group_001\n")
            .expect("stage output");

        let output = PrecomputedEngine.cluster(dir.path()).expect("cluster");
        let path = output.into_result().expect("success");
        assert!(path.ends_with(MOTIF_LIST_FILE));
    }

    #[test]
    fn test_missing_output_is_engine_failure() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = PrecomputedEngine.cluster(dir.path()).expect("cluster");
        assert!(matches!(
            output.into_result(),
            Err(PipelineError::EngineFailed { .. })
        ));
    }
}
