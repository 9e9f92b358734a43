//! Multi-agent orchestration for Soundcheck.
//!
//! A request fans out to up to three generators (DAW, arranger, drummer)
//! behind a routing classifier, all talking to a model through the
//! [`model::TextModel`] seam. The orchestrator merges their outputs into one
//! ordered action list, batched or streamed.

pub mod classifier;
pub mod error;
pub mod generators;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod prompts;

pub use classifier::Classification;
pub use error::{ModelError, OrchestratorError};
pub use generators::{ArrangerGenerator, DawGenerator, DrummerGenerator};
pub use model::openai::{OpenAiModel, OpenAiModelConfig};
pub use model::{
    Completion, ConstrainedRequest, RequestCtx, StructuredCompletion, StructuredRequest, TextModel,
};
pub use orchestrator::Orchestrator;
