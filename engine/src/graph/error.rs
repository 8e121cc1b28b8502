//! Workflow engine errors

use sdk::errors::EngineError;
use thiserror::Error;

/// Wiring defects detected while compiling a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefinitionError {
    #[error("No entry point set")]
    MissingEntryPoint,

    #[error("Entry point '{0}' is not a registered stage")]
    UnknownEntryPoint(String),

    #[error("Stage '{0}' is registered twice")]
    DuplicateStage(String),

    #[error("Stage name '{0}' is reserved")]
    ReservedName(String),

    #[error("Edge source '{0}' is not a registered stage")]
    UnknownSource(String),

    #[error("Edge '{from}' -> '{to}' targets an unregistered stage")]
    UnknownTarget { from: String, to: String },

    #[error("Stage '{0}' has more than one outgoing edge")]
    ConflictingEdges(String),

    #[error("Stage '{0}' has no outgoing edge and is not terminal")]
    DeadEnd(String),

    #[error("Default label '{label}' of stage '{from}' is not in its target map")]
    UnmappedDefault { from: String, label: String },
}

/// Failures that abort a run of a compiled graph
#[derive(Debug, Error)]
pub enum GraphRunError {
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Run exceeded {limit} steps without reaching the end")]
    StepLimitExceeded { limit: usize },
}

impl GraphRunError {
    /// Name of the stage that aborted the run, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            GraphRunError::StageFailed { stage, .. } => Some(stage),
            GraphRunError::StepLimitExceeded { .. } => None,
        }
    }
}

impl From<GraphDefinitionError> for EngineError {
    fn from(err: GraphDefinitionError) -> Self {
        EngineError::GraphDefinition(err.to_string())
    }
}

impl From<GraphRunError> for EngineError {
    fn from(err: GraphRunError) -> Self {
        match err {
            GraphRunError::StageFailed { stage, source } => EngineError::RunFailed {
                stage,
                reason: format!("{:#}", source),
            },
            GraphRunError::StepLimitExceeded { limit } => EngineError::RunFailed {
                stage: "<engine>".to_string(),
                reason: format!("step limit {} exceeded", limit),
            },
        }
    }
}
