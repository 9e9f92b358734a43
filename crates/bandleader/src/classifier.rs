//! Routing classification.
//!
//! A small, cheap model decides which content generators a request needs.
//! The response is schema-constrained and parsed strictly; anything the
//! strict parse rejects fails the request as out-of-scope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use dawproto::Usage;

use crate::error::OrchestratorError;
use crate::model::{RequestCtx, StructuredRequest, TextModel};
use crate::prompts;

/// Which generators the request needs. The DAW generator always runs and is
/// not part of the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    /// Melodic/harmonic content: notes, chords, arpeggios, progressions.
    pub needs_arranger: bool,
    /// Rhythmic content: kick/snare/hat grid patterns.
    pub needs_drummer: bool,
}

fn schema_for<T: JsonSchema>() -> serde_json::Value {
    let settings = schemars::generate::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let gen = settings.into_generator();
    let schema = gen.into_root_schema_for::<T>();
    serde_json::to_value(&schema).unwrap_or_default()
}

pub async fn classify(
    model: &dyn TextModel,
    ctx: &RequestCtx,
    utterance: &str,
) -> Result<(Classification, Usage), OrchestratorError> {
    let request = StructuredRequest {
        system_prompt: prompts::CLASSIFIER_PROMPT.to_string(),
        user_prompt: utterance.to_string(),
        schema_name: "classify_request",
        schema: schema_for::<Classification>(),
    };

    let completion = ctx.run(model.structured(request)).await?;

    let classification: Classification = serde_json::from_value(completion.value.clone())
        .map_err(|e| {
            OrchestratorError::Classification(format!(
                "unparseable classifier response {}: {}",
                completion.value, e
            ))
        })?;

    tracing::debug!(
        needs_arranger = classification.needs_arranger,
        needs_drummer = classification.needs_drummer,
        "classified request"
    );

    Ok((classification, completion.usage))
}
