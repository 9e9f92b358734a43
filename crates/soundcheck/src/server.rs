//! Router assembly and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

use bandleader::{OpenAiModel, OpenAiModelConfig, Orchestrator};
use soundconf::{AuthMode, SoundConfig};

use crate::{auth, routes};

/// Shared application state. The orchestrator owns the generators; the
/// server owns nothing else: no project state, no sessions.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub auth_mode: AuthMode,
}

/// Per-request id, stashed in extensions and echoed in `x-request-id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!(
        "http_request",
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Build the full router. `/health` skips auth; everything under `/api/v1`
/// goes through the configured auth mode.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chat", post(routes::handle_chat))
        .route("/chat/stream", post(routes::handle_chat_stream))
        .route("/dsl", post(routes::handle_dsl))
        .route("/dsl/stream", post(routes::handle_dsl_stream))
        .route("/drummer/generate", post(routes::handle_drummer))
        .route("/aideas/generations", post(routes::handle_arranger))
        .layer(axum::middleware::from_fn_with_state(
            state.auth_mode,
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(routes::handle_health))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until SIGINT/SIGTERM.
pub async fn run(config: SoundConfig) -> Result<()> {
    info!("🎚️ Soundcheck starting");
    info!("   Port: {}", config.server.port);
    info!("   Auth: {}", config.auth.mode.as_str());
    info!(
        "   Model: {} (classifier: {})",
        config.model.model, config.model.classifier_model
    );
    if config.model.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is unset; model calls will fail unless the provider at base_url accepts keyless requests");
    }

    let model = Arc::new(OpenAiModel::new(&OpenAiModelConfig {
        api_key: config.model.api_key.clone(),
        base_url: config.model.base_url.clone(),
        model: config.model.model.clone(),
        classifier_model: config.model.classifier_model.clone(),
    }));
    let orchestrator = Arc::new(Orchestrator::new(
        model,
        Duration::from_secs(config.model.timeout_secs),
    ));

    let app = router(AppState {
        orchestrator,
        auth_mode: config.auth.mode,
    });

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!("🎚️ Soundcheck ready!");
    info!("   Chat: POST http://{}/api/v1/chat", addr);
    info!("   Stream: POST http://{}/api/v1/chat/stream", addr);
    info!("   Health: GET http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_stop_signal())
        .await
        .context("server error")?;

    info!("all in-flight requests drained, bye");
    Ok(())
}

/// Resolves once the process is asked to stop (ctrl-c anywhere, SIGTERM on
/// unix). In-flight requests keep running until they finish.
async fn wait_for_stop_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM, ctrl-c only");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let which = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl-c",
        _ = terminate => "terminate signal",
    };
    info!(signal = which, "stop requested, draining requests");
}
