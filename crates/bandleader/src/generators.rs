//! The three generators. Each one asks the model for grammar-conformant
//! text, parses it with the matching chart dialect, and hands typed output
//! back to the orchestrator. Streaming is simulated: the model call is
//! non-streaming and parsed actions are replayed through the callback.

use std::sync::Arc;

use dawproto::{Action, StateSnapshot, Usage};

use crate::error::{ModelError, OrchestratorError};
use crate::model::{ConstrainedRequest, RequestCtx, TextModel};
use crate::prompts;

fn state_json(state: &StateSnapshot) -> Result<String, OrchestratorError> {
    serde_json::to_string(state)
        .map_err(|e| ModelError::Malformed(format!("unserializable snapshot: {e}")).into())
}

/// Output of one DAW generator run.
#[derive(Debug)]
pub struct DawOutput {
    pub dsl: String,
    pub actions: Vec<Action>,
    pub usage: Usage,
}

/// Structural operations: tracks, clips, FX, automation. Never notes. The
/// gatekeeper: if this generator fails, the request fails.
#[derive(Clone)]
pub struct DawGenerator {
    model: Arc<dyn TextModel>,
}

impl DawGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        DawGenerator { model }
    }

    #[tracing::instrument(skip_all)]
    pub async fn generate(
        &self,
        ctx: &RequestCtx,
        utterance: &str,
        state: &StateSnapshot,
        elevated: bool,
    ) -> Result<DawOutput, OrchestratorError> {
        let mut system_prompt = prompts::DAW_PROMPT.to_string();
        if elevated {
            system_prompt.push('\n');
            system_prompt.push_str(prompts::DAW_ELEVATION_PROMPT);
        }

        let completion = ctx
            .run(self.model.generate(ConstrainedRequest {
                system_prompt,
                user_prompt: prompts::user_prompt(utterance, &state_json(state)?),
                dialect: chart::daw::dialect(),
            }))
            .await?;

        let outcome = chart::parse_daw(&completion.text, state)?;
        Ok(DawOutput {
            dsl: completion.text,
            actions: outcome.value,
            usage: completion.usage,
        })
    }

    /// Parse the complete output, then replay actions one by one.
    pub async fn generate_stream(
        &self,
        ctx: &RequestCtx,
        utterance: &str,
        state: &StateSnapshot,
        elevated: bool,
        on_action: &mut (dyn FnMut(&Action) + Send),
    ) -> Result<DawOutput, OrchestratorError> {
        let output = self.generate(ctx, utterance, state, elevated).await?;
        for action in &output.actions {
            on_action(action);
        }
        Ok(output)
    }
}

/// Output of one arranger run: typed records, not yet note events.
#[derive(Debug)]
pub struct ArrangerOutput {
    pub dsl: String,
    pub actions: Vec<chart::ArrangerAction>,
    pub usage: Usage,
}

/// Melodic/harmonic content. Failure is a warning; the response just lacks
/// its contribution.
#[derive(Clone)]
pub struct ArrangerGenerator {
    model: Arc<dyn TextModel>,
}

impl ArrangerGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        ArrangerGenerator { model }
    }

    #[tracing::instrument(skip_all)]
    pub async fn generate(
        &self,
        ctx: &RequestCtx,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<ArrangerOutput, OrchestratorError> {
        let completion = ctx
            .run(self.model.generate(ConstrainedRequest {
                system_prompt: prompts::ARRANGER_PROMPT.to_string(),
                user_prompt: prompts::user_prompt(utterance, &state_json(state)?),
                dialect: chart::arranger::dialect(),
            }))
            .await?;

        let outcome = chart::parse_arranger(&completion.text)?;
        Ok(ArrangerOutput {
            dsl: completion.text,
            actions: outcome.value,
            usage: completion.usage,
        })
    }
}

/// Output of one drummer run: ready-made `drum_pattern` actions.
#[derive(Debug)]
pub struct DrummerOutput {
    pub dsl: String,
    pub actions: Vec<Action>,
    pub usage: Usage,
}

/// Rhythmic grid patterns. Failure is a warning, like the arranger.
#[derive(Clone)]
pub struct DrummerGenerator {
    model: Arc<dyn TextModel>,
}

impl DrummerGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        DrummerGenerator { model }
    }

    #[tracing::instrument(skip_all)]
    pub async fn generate(
        &self,
        ctx: &RequestCtx,
        utterance: &str,
        state: &StateSnapshot,
    ) -> Result<DrummerOutput, OrchestratorError> {
        let completion = ctx
            .run(self.model.generate(ConstrainedRequest {
                system_prompt: prompts::DRUMMER_PROMPT.to_string(),
                user_prompt: prompts::user_prompt(utterance, &state_json(state)?),
                dialect: chart::drummer::dialect(),
            }))
            .await?;

        let outcome = chart::parse_drummer(&completion.text)?;
        Ok(DrummerOutput {
            dsl: completion.text,
            actions: outcome.value,
            usage: completion.usage,
        })
    }
}
