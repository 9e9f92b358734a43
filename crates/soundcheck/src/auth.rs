//! Authentication modes.
//!
//! `none` accepts everything. `gateway` trusts identity headers injected by
//! an upstream gateway unconditionally: `X-User-ID` is required, the rest
//! ride along. The core never mints or validates tokens.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dawproto::ErrorBody;
use soundconf::AuthMode;

/// Gateway-supplied identity, stashed in request extensions.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub api_key_id: Option<String>,
    pub api_key_scopes: Option<String>,
}

fn header_string(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub async fn require_auth(
    State(mode): State<AuthMode>,
    mut request: Request,
    next: Next,
) -> Response {
    match mode {
        AuthMode::None => next.run(request).await,
        AuthMode::Gateway => {
            let Some(user_id) = header_string(&request, "X-User-ID") else {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody::new("unauthorized", "missing X-User-ID header")),
                )
                    .into_response();
            };

            let user = UserContext {
                user_id,
                email: header_string(&request, "X-User-Email"),
                role: header_string(&request, "X-User-Role"),
                api_key_id: header_string(&request, "X-API-Key-ID"),
                api_key_scopes: header_string(&request, "X-API-Key-Scopes"),
            };
            tracing::debug!(user_id = %user.user_id, "gateway-authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[test]
    fn test_header_string() {
        let request = HttpRequest::builder()
            .header("X-User-ID", "user-42")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            header_string(&request, "X-User-ID").as_deref(),
            Some("user-42")
        );
        assert_eq!(header_string(&request, "X-User-Email"), None);
    }
}
