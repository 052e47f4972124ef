//! Error types for rma-core.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for the atlas pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage name did not resolve to a registered stage.
    #[error("Unknown stage `{0}`")]
    UnknownStage(String),

    /// A precondition was violated: nothing to process, no data produced
    /// where data was required, or stages run out of order.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A stage with `stop_on_failure` failed; the whole run plan aborts.
    #[error("Stage `{stage}` failed")]
    StageFailed {
        /// The stage that failed.
        stage: String,
    },

    /// The external geometry engine reported an error message.
    #[error("Geometry engine failed: {message}")]
    EngineFailed {
        /// The message returned by the engine.
        message: String,
    },

    /// A release commit failed and its rows were purged.
    #[error("Release `{release_id}` ({release_type}) failed to commit and was purged: {source}")]
    ReleaseAborted {
        /// The release id that was rolled back.
        release_id: String,
        /// The release type.
        release_type: String,
        /// The underlying failure.
        #[source]
        source: Box<PipelineError>,
    },

    /// A motif id did not have the `TYPE_HANDLE.VERSION` shape.
    #[error("Malformed motif id `{0}`")]
    MalformedMotifId(String),

    /// A release id did not have the `MAJOR.MINOR` shape.
    #[error("Malformed release id `{0}`")]
    MalformedReleaseId(String),

    /// A CSV input could not be read or parsed.
    #[error("CSV error at `{path}`: {message}")]
    Csv {
        /// The file being read.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// A configuration value failed validation.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid value.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// Database error.
    #[error(transparent)]
    Db(#[from] rma_db::DbError),

    /// Archive catalog error, including exhausted retries.
    #[error(transparent)]
    Archive(#[from] rma_utils::UtilsError),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a CSV error with file context.
    pub fn csv(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a stage-failed error.
    pub fn stage_failed(stage: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
        }
    }
}
