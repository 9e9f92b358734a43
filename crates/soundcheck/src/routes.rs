//! Request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use serde_json::json;

use dawproto::{Action, ChatRequest, ChatResponse, DslDialect, DslRequest, DslResponse, Usage};

use crate::error::ApiError;
use crate::server::{AppState, RequestId};
use crate::sse::{EventStream, SseSink};

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/v1/chat: batched orchestration.
pub async fn handle_chat(
    State(state): State<AppState>,
    Extension(id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (actions, usage) = state
        .orchestrator
        .generate_actions(&request.utterance, &request.state)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(Some(&id.0)))?;
    Ok(Json(ChatResponse { actions, usage }))
}

/// POST /api/v1/chat/stream: streaming orchestration over SSE.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> EventStream {
    let (sink, stream) = SseSink::channel();

    tokio::spawn(async move {
        let result = state
            .orchestrator
            .generate_actions_stream(&request.utterance, &request.state, |action| {
                sink.action(action);
            })
            .await;
        match result {
            Ok(_) => sink.done(),
            Err(e) => {
                tracing::warn!(error = %e, "streaming request failed");
                sink.error(e.kind(), &e.to_string());
            }
        }
    });

    stream
}

fn parse_dsl(request: &DslRequest) -> Result<DslResponse, ApiError> {
    let statements = chart::parse_program(&request.dsl)?;
    let canonical = chart::render(&statements);

    let (actions, warnings) = match request.dialect {
        DslDialect::Daw => {
            let outcome = chart::daw::parse_statements(&statements, &request.state)?;
            (outcome.value, outcome.warnings)
        }
        DslDialect::Arranger => {
            let outcome = chart::arranger::parse_statements(&statements)?;
            let track = request
                .state
                .selected_track()
                .map(|t| t.index)
                .unwrap_or(0);
            let notes = chart::to_note_events(&outcome.value);
            (vec![Action::AddMidi { track, notes }], outcome.warnings)
        }
        DslDialect::Drummer => {
            let outcome = chart::drummer::parse_statements(&statements)?;
            (outcome.value, outcome.warnings)
        }
    };

    Ok(DslResponse {
        actions,
        usage: Usage::default(),
        canonical,
        warnings: warnings.into_iter().map(|w| w.message).collect(),
    })
}

/// POST /api/v1/dsl: parse a DSL string directly, no model in the loop.
pub async fn handle_dsl(
    Extension(id): Extension<RequestId>,
    Json(request): Json<DslRequest>,
) -> Result<Json<DslResponse>, ApiError> {
    parse_dsl(&request)
        .map(Json)
        .map_err(|e| e.with_request_id(Some(&id.0)))
}

/// POST /api/v1/dsl/stream: same, replayed over SSE.
pub async fn handle_dsl_stream(Json(request): Json<DslRequest>) -> EventStream {
    let (sink, stream) = SseSink::channel();

    tokio::spawn(async move {
        match parse_dsl(&request) {
            Ok(response) => {
                for action in &response.actions {
                    sink.action(action);
                }
                sink.done();
            }
            Err(e) => sink.error(&e.body.error.kind, &e.body.error.message),
        }
    });

    stream
}

/// POST /api/v1/drummer/generate: drummer only.
pub async fn handle_drummer(
    State(state): State<AppState>,
    Extension(id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (actions, usage) = state
        .orchestrator
        .drummer_actions(&request.utterance, &request.state)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(Some(&id.0)))?;
    Ok(Json(ChatResponse { actions, usage }))
}

/// POST /api/v1/aideas/generations: arranger only.
pub async fn handle_arranger(
    State(state): State<AppState>,
    Extension(id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (actions, usage) = state
        .orchestrator
        .arranger_actions(&request.utterance, &request.state)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(Some(&id.0)))?;
    Ok(Json(ChatResponse { actions, usage }))
}
