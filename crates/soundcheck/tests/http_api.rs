//! HTTP surface tests: the router driven in-process with a scripted model
//! behind the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use bandleader::model::StructuredCompletion;
use bandleader::{Completion, ConstrainedRequest, ModelError, Orchestrator, StructuredRequest, TextModel};
use dawproto::Usage;
use soundcheck::{router, AppState};
use soundconf::AuthMode;

struct ScriptedModel {
    classify_json: serde_json::Value,
    daw_dsl: Option<String>,
    arranger_dsl: Option<String>,
    drummer_dsl: Option<String>,
}

impl ScriptedModel {
    fn structural(daw: &str) -> Self {
        ScriptedModel {
            classify_json: serde_json::json!({"needs_arranger": false, "needs_drummer": false}),
            daw_dsl: Some(daw.to_string()),
            arranger_dsl: None,
            drummer_dsl: None,
        }
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, request: ConstrainedRequest<'_>) -> Result<Completion, ModelError> {
        let dsl = match request.dialect.name {
            "daw" => &self.daw_dsl,
            "arranger" => &self.arranger_dsl,
            "drummer" => &self.drummer_dsl,
            other => panic!("unexpected dialect {other}"),
        };
        dsl.clone()
            .map(|text| Completion {
                text,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            })
            .ok_or_else(|| ModelError::Provider("scripted failure".to_string()))
    }

    async fn structured(
        &self,
        _request: StructuredRequest,
    ) -> Result<StructuredCompletion, ModelError> {
        Ok(StructuredCompletion {
            value: self.classify_json.clone(),
            usage: Usage {
                prompt_tokens: 4,
                completion_tokens: 1,
                total_tokens: 5,
            },
        })
    }
}

fn app(model: ScriptedModel, auth_mode: AuthMode) -> axum::Router {
    router(AppState {
        orchestrator: Arc::new(Orchestrator::new(
            Arc::new(model),
            Duration::from_secs(5),
        )),
        auth_mode,
    })
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let app = app(ScriptedModel::structural("track();"), AuthMode::Gateway);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn chat_returns_actions_and_usage() {
    let app = app(
        ScriptedModel::structural(r#"track(name="Bass");"#),
        AuthMode::None,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            serde_json::json!({"utterance": "create a track called Bass", "state": {"tracks": []}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["actions"][0]["kind"], "create_track");
    assert_eq!(json["actions"][0]["index"], 0);
    assert_eq!(json["actions"][0]["name"], "Bass");
    assert_eq!(json["usage"]["total_tokens"], 20);
}

#[tokio::test]
async fn plugin_clients_send_question() {
    let app = app(
        ScriptedModel::structural(r#"track(name="Bass");"#),
        AuthMode::None,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            serde_json::json!({"question": "create a track called Bass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn out_of_scope_is_400_with_no_actions() {
    let app = app(
        ScriptedModel::structural("// ERROR: cake is not music"),
        AuthMode::None,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            serde_json::json!({"utterance": "bake me a cake"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "out_of_scope");
    assert!(json.get("actions").is_none());
}

#[tokio::test]
async fn provider_failure_is_502() {
    let model = ScriptedModel {
        classify_json: serde_json::json!({"needs_arranger": false, "needs_drummer": false}),
        daw_dsl: None,
        arranger_dsl: None,
        drummer_dsl: None,
    };
    let app = app(model, AuthMode::None);
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            serde_json::json!({"utterance": "do something"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "provider_error");
}

#[tokio::test]
async fn gateway_auth_requires_user_id() {
    let app = app(
        ScriptedModel::structural(r#"track(name="Bass");"#),
        AuthMode::Gateway,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            serde_json::json!({"utterance": "create a track called Bass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gateway_auth_trusts_headers() {
    let app = app(
        ScriptedModel::structural(r#"track(name="Bass");"#),
        AuthMode::Gateway,
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/chat")
        .header("content-type", "application/json")
        .header("X-User-ID", "user-42")
        .header("X-User-Email", "user@example.com")
        .body(Body::from(
            serde_json::json!({"utterance": "create a track called Bass"}).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dsl_endpoint_needs_no_model() {
    // daw_dsl is a failure: proof the endpoint never calls the model
    let model = ScriptedModel {
        classify_json: serde_json::json!({"needs_arranger": false, "needs_drummer": false}),
        daw_dsl: None,
        arranger_dsl: None,
        drummer_dsl: None,
    };
    let app = app(model, AuthMode::None);
    let response = app
        .oneshot(post_json(
            "/api/v1/dsl",
            serde_json::json!({
                "dsl": "track(id=1).set_track(mute=true)",
                "state": {"tracks": [{"index": 0, "name": "Drums"}]}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["actions"][0]["kind"], "set_track");
    assert_eq!(json["actions"][0]["track"], 0);
    assert!(json["canonical"]
        .as_str()
        .unwrap()
        .contains("set_track(mute=true)"));
}

#[tokio::test]
async fn dsl_endpoint_surfaces_parse_errors() {
    let app = app(ScriptedModel::structural("unused"), AuthMode::None);
    let response = app
        .oneshot(post_json(
            "/api/v1/dsl",
            serde_json::json!({"dsl": "definitely not a program"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "parse_error");
}

#[tokio::test]
async fn drummer_endpoint_returns_patterns() {
    let model = ScriptedModel {
        classify_json: serde_json::json!({"needs_arranger": false, "needs_drummer": false}),
        daw_dsl: None,
        arranger_dsl: None,
        drummer_dsl: Some(r#"pattern(drum="kick", grid="x---x---x---x---");"#.to_string()),
    };
    let app = app(model, AuthMode::None);
    let response = app
        .oneshot(post_json(
            "/api/v1/drummer/generate",
            serde_json::json!({"utterance": "four on the floor"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["actions"][0]["kind"], "drum_pattern");
    assert_eq!(json["actions"][0]["grid"], "x---x---x---x---");
}

#[tokio::test]
async fn arranger_endpoint_returns_one_add_midi() {
    let model = ScriptedModel {
        classify_json: serde_json::json!({"needs_arranger": false, "needs_drummer": false}),
        daw_dsl: None,
        arranger_dsl: Some(r#"chord(symbol="Cmaj7", length=4);"#.to_string()),
        drummer_dsl: None,
    };
    let app = app(model, AuthMode::None);
    let response = app
        .oneshot(post_json(
            "/api/v1/aideas/generations",
            serde_json::json!({
                "utterance": "a rich C chord",
                "state": {"tracks": [{"index": 0, "name": "Keys", "selected": true}]}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["actions"].as_array().unwrap().len(), 1);
    assert_eq!(json["actions"][0]["kind"], "add_midi");
    assert_eq!(json["actions"][0]["track"], 0);
    assert_eq!(json["actions"][0]["notes"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn chat_stream_frames_actions_then_done() {
    let app = app(
        ScriptedModel::structural(r#"track(name="Bass");"#),
        AuthMode::None,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({"utterance": "create a track called Bass"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(body.contains("event: action"), "body was: {body}");
    assert!(body.contains(r#""kind":"create_track""#), "body was: {body}");
    assert!(body.contains("event: done"), "body was: {body}");

    let action_at = body.find("event: action").unwrap();
    let done_at = body.find("event: done").unwrap();
    assert!(action_at < done_at);
}

#[tokio::test]
async fn chat_stream_closes_with_error_event() {
    let app = app(
        ScriptedModel::structural("// ERROR: not music"),
        AuthMode::None,
    );
    let response = app
        .oneshot(post_json(
            "/api/v1/chat/stream",
            serde_json::json!({"utterance": "bake me a cake"}),
        ))
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("event: error"), "body was: {body}");
    assert!(!body.contains("event: action"), "body was: {body}");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = app(ScriptedModel::structural("track();"), AuthMode::None);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
