//! HTTP request and response bodies.

use crate::action::Action;
use crate::state::StateSnapshot;
use serde::{Deserialize, Serialize};

/// Token accounting for a response, summed across every model call the
/// request made (classifier included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    pub fn add(&mut self, other: Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        self.add(other);
    }
}

/// Body for `/api/v1/chat`, `/api/v1/chat/stream`, and the single-generator
/// endpoints. Desktop clients send `utterance`; the plugin sends `question`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "question")]
    pub utterance: String,
    #[serde(default)]
    pub state: StateSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub actions: Vec<Action>,
    pub usage: Usage,
}

/// Which DSL dialect `/api/v1/dsl` should parse with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DslDialect {
    #[default]
    Daw,
    Arranger,
    Drummer,
}

/// Body for `/api/v1/dsl` and `/api/v1/dsl/stream`: parse a DSL string
/// directly, no model in the loop.
#[derive(Debug, Clone, Deserialize)]
pub struct DslRequest {
    pub dsl: String,
    #[serde(default)]
    pub state: StateSnapshot,
    #[serde(default)]
    pub dialect: DslDialect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DslResponse {
    pub actions: Vec<Action>,
    pub usage: Usage,
    /// Pretty-printed canonical form of the parsed DSL.
    pub canonical: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// JSON error body; also the payload of SSE `error` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorBody {
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
                request_id: None,
            },
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.error.request_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_question_alias() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"question": "create a track called Bass"}"#).unwrap();
        assert_eq!(req.utterance, "create a track called Bass");
        assert_eq!(req.state.track_count(), 0);
    }

    #[test]
    fn test_usage_sum() {
        let mut usage = Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        usage += Usage {
            prompt_tokens: 2,
            completion_tokens: 3,
            total_tokens: 5,
        };
        assert_eq!(usage.total_tokens, 20);
    }

    #[test]
    fn test_dialect_default() {
        let req: DslRequest = serde_json::from_str(r#"{"dsl": "track()"}"#).unwrap();
        assert_eq!(req.dialect, DslDialect::Daw);

        let req: DslRequest =
            serde_json::from_str(r#"{"dsl": "pattern()", "dialect": "drummer"}"#).unwrap();
        assert_eq!(req.dialect, DslDialect::Drummer);
    }
}
