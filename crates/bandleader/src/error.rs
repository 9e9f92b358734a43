//! Error taxonomy for orchestration.
//!
//! Out-of-scope and classification failures are the client's fault (4xx at
//! the HTTP layer); provider and parse failures are ours (5xx). Errors are
//! never partially returned: a failed request produces no actions.

use thiserror::Error;

/// Failures at the model-call layer.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("model call exceeded its deadline")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    #[error("model returned no usable output: {0}")]
    Malformed(String),
}

/// Failures of a whole request.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The classifier or a generator judged the utterance outside music
    /// production.
    #[error("out of scope: {0}")]
    OutOfScope(String),

    /// The classifier's structured response could not be parsed. Treated as
    /// out-of-scope by the HTTP layer.
    #[error("classification failed: {0}")]
    Classification(String),

    #[error(transparent)]
    Provider(#[from] ModelError),

    #[error("parse error: {0}")]
    Parse(chart::ChartError),
}

impl From<chart::ChartError> for OrchestratorError {
    fn from(err: chart::ChartError) -> Self {
        match err {
            chart::ChartError::OutOfScope(reason) => OrchestratorError::OutOfScope(reason),
            other => OrchestratorError::Parse(other),
        }
    }
}

impl OrchestratorError {
    /// Whether the client caused this (HTTP 4xx) rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrchestratorError::OutOfScope(_) | OrchestratorError::Classification(_)
        )
    }

    /// Stable wire name for error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::OutOfScope(_) => "out_of_scope",
            OrchestratorError::Classification(_) => "classification_error",
            OrchestratorError::Provider(_) => "provider_error",
            OrchestratorError::Parse(_) => "parse_error",
        }
    }
}
