//! Parse errors and collected warnings.
//!
//! Fatal problems (unknown methods, malformed literals, out-of-scope markers)
//! abort the parse. Everything else is collected as a warning and the parse
//! continues; callers decide whether to log or surface them.

use serde::Serialize;
use thiserror::Error;

/// Fatal DSL errors.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The model marked the request as outside music production.
    #[error("out of scope: {0}")]
    OutOfScope(String),

    /// Input contained no recognized DSL construct.
    #[error("not recognized as DSL: {0}")]
    NotDsl(String),

    #[error("syntax error near {near:?}: {message}")]
    Syntax { message: String, near: String },

    #[error("unknown method {name:?} in {dialect} dialect")]
    UnknownMethod { dialect: &'static str, name: String },

    #[error("unknown collection {0:?} (expected tracks or clips)")]
    UnknownCollection(String),

    #[error("method {method}: {message}")]
    BadArgument { method: String, message: String },

    /// `track(id=N)` referenced a track that neither exists in the snapshot
    /// nor was created earlier in the same response.
    #[error("track id {id} out of range ({available} tracks available)")]
    TrackOutOfRange { id: usize, available: usize },

    #[error("invalid pitch name {0:?}")]
    BadPitch(String),

    #[error("invalid chord symbol {0:?}")]
    BadChord(String),

    #[error("invalid drum grid {grid:?}: {message}")]
    BadGrid { grid: String, message: String },
}

/// A non-fatal parse observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub message: String,
}

/// Collector threaded through hosts while a program is evaluated.
#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Warnings(Vec::new())
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "chart", "{}", message);
        self.0.push(Warning { message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.0
    }
}

/// A parse that survived: the value plus whatever was worth mentioning.
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> ParseOutcome<T> {
    pub fn new(value: T, warnings: Warnings) -> Self {
        ParseOutcome {
            value,
            warnings: warnings.into_vec(),
        }
    }
}
