//! OpenAI-compatible `TextModel` implementation.
//!
//! The grammar constraint rides as a forced function tool: the model must
//! call a single function whose one string parameter is documented by the
//! dialect's grammar, so the provider rejects free-form continuations. The
//! classifier path forces a function whose parameters are the target schema.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolArgs, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionName, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use dawproto::Usage;
use serde_json::json;

use crate::error::ModelError;
use crate::model::{
    Completion, ConstrainedRequest, StructuredCompletion, StructuredRequest, TextModel,
};

/// Configuration for the OpenAI-backed model.
#[derive(Debug, Clone)]
pub struct OpenAiModelConfig {
    pub api_key: String,
    /// Base URL override for OpenAI-compatible providers; None for the
    /// default endpoint.
    pub base_url: Option<String>,
    /// Model for the generators.
    pub model: String,
    /// Small, cheap model for routing classification.
    pub classifier_model: String,
}

pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
    classifier_model: String,
}

impl OpenAiModel {
    pub fn new(config: &OpenAiModelConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key.clone());
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.clone());
        }
        OpenAiModel {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            classifier_model: config.classifier_model.clone(),
        }
    }

    fn messages(
        system: &str,
        user: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, ModelError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;
        Ok(vec![system.into(), user.into()])
    }

    fn forced_choice(name: &str) -> ChatCompletionToolChoiceOption {
        ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
            r#type: ChatCompletionToolType::Function,
            function: FunctionName {
                name: name.to_string(),
            },
        })
    }

    fn usage_of(response: &async_openai::types::CreateChatCompletionResponse) -> Usage {
        response
            .usage
            .as_ref()
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default()
    }

    /// The arguments of the first tool call, or None if the model answered
    /// with plain content instead.
    fn tool_arguments(
        response: &async_openai::types::CreateChatCompletionResponse,
    ) -> Option<String> {
        response
            .choices
            .first()?
            .message
            .tool_calls
            .as_ref()?
            .first()
            .map(|call| call.function.arguments.clone())
    }
}

#[async_trait]
impl TextModel for OpenAiModel {
    #[tracing::instrument(skip(self, request), fields(dialect = request.dialect.name))]
    async fn generate(&self, request: ConstrainedRequest<'_>) -> Result<Completion, ModelError> {
        let function_name = format!("emit_{}_chart", request.dialect.name);
        let tool = ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(
                FunctionObjectArgs::default()
                    .name(&function_name)
                    .description(format!(
                        "Emit chart DSL ({} dialect). The source MUST conform to this grammar:\n\n{}",
                        request.dialect.name, request.dialect.grammar
                    ))
                    .parameters(json!({
                        "type": "object",
                        "properties": {
                            "source": {
                                "type": "string",
                                "description": "The complete DSL program, nothing else."
                            }
                        },
                        "required": ["source"]
                    }))
                    .build()
                    .map_err(|e| ModelError::Provider(e.to_string()))?,
            )
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::messages(
                &request.system_prompt,
                &request.user_prompt,
            )?)
            .tools(vec![tool])
            .tool_choice(Self::forced_choice(&function_name))
            .temperature(0.0)
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let usage = Self::usage_of(&response);

        let text = match Self::tool_arguments(&response) {
            Some(arguments) => {
                let value: serde_json::Value = serde_json::from_str(&arguments)
                    .map_err(|e| ModelError::Malformed(format!("tool arguments: {e}")))?;
                value
                    .get("source")
                    .and_then(|s| s.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        ModelError::Malformed("tool call missing source field".to_string())
                    })?
            }
            // Some providers answer inline despite the forced tool; take the
            // content as the DSL source and let the parser judge it.
            None => response
                .choices
                .first()
                .and_then(|c| c.message.content.clone())
                .ok_or_else(|| ModelError::Malformed("empty completion".to_string()))?,
        };

        Ok(Completion { text, usage })
    }

    #[tracing::instrument(skip(self, request), fields(schema = request.schema_name))]
    async fn structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredCompletion, ModelError> {
        let tool = ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(
                FunctionObjectArgs::default()
                    .name(request.schema_name)
                    .description("Report the structured result.")
                    .parameters(request.schema)
                    .build()
                    .map_err(|e| ModelError::Provider(e.to_string()))?,
            )
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.classifier_model)
            .messages(Self::messages(
                &request.system_prompt,
                &request.user_prompt,
            )?)
            .tools(vec![tool])
            .tool_choice(Self::forced_choice(request.schema_name))
            .temperature(0.0)
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let usage = Self::usage_of(&response);

        let arguments = Self::tool_arguments(&response)
            .ok_or_else(|| ModelError::Malformed("no structured tool call".to_string()))?;
        let value = serde_json::from_str(&arguments)
            .map_err(|e| ModelError::Malformed(format!("structured arguments: {e}")))?;

        Ok(StructuredCompletion { value, usage })
    }
}
