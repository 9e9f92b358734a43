//! The model-call abstraction.
//!
//! Generators talk to a `TextModel`, never to a vendor SDK. The trait has
//! two shapes: grammar-constrained text generation (the DSL path) and
//! structured JSON output (the classifier path). The OpenAI-backed
//! implementation lives in [`openai`]; tests script a fake.

pub mod openai;

use async_trait::async_trait;
use dawproto::Usage;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ModelError;

/// A request for grammar-constrained generation.
pub struct ConstrainedRequest<'a> {
    pub system_prompt: String,
    pub user_prompt: String,
    /// The dialect whose grammar constrains the output.
    pub dialect: &'a chart::Dialect,
}

/// A request for schema-constrained structured output.
pub struct StructuredRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema_name: &'static str,
    pub schema: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Clone)]
pub struct StructuredCompletion {
    pub value: serde_json::Value,
    pub usage: Usage,
}

/// Uniform surface for model calls. Implementations block for as long as the
/// provider takes; deadlines and cancellation are imposed by the caller
/// through [`RequestCtx::run`].
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, request: ConstrainedRequest<'_>) -> Result<Completion, ModelError>;

    async fn structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredCompletion, ModelError>;
}

/// Request-scoped deadline and cancellation, threaded through every model
/// call. Cancelling the token aborts in-flight calls; the per-call deadline
/// is inherited from the request.
#[derive(Clone)]
pub struct RequestCtx {
    pub cancel: CancellationToken,
    pub deadline: Duration,
}

impl RequestCtx {
    pub fn new(deadline: Duration) -> Self {
        RequestCtx {
            cancel: CancellationToken::new(),
            deadline,
        }
    }

    /// Run a model-call future under this context's deadline and token.
    pub async fn run<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ModelError>>,
    ) -> Result<T, ModelError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ModelError::Cancelled),
            outcome = tokio::time::timeout(self.deadline, fut) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout),
            },
        }
    }
}
