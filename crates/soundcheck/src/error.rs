//! HTTP error mapping.
//!
//! Out-of-scope and classification errors are the client's (400); provider
//! failures surface as 502, parse failures as 500. Bodies are JSON with a
//! stable `kind` and the request id when one is known.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bandleader::OrchestratorError;
use dawproto::ErrorBody;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn with_request_id(mut self, id: Option<&str>) -> Self {
        if let Some(id) = id {
            self.body = self.body.with_request_id(id);
        }
        self
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let status = match &err {
            OrchestratorError::OutOfScope(_) | OrchestratorError::Classification(_) => {
                StatusCode::BAD_REQUEST
            }
            OrchestratorError::Provider(_) => StatusCode::BAD_GATEWAY,
            OrchestratorError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            body: ErrorBody::new(err.kind(), err.to_string()),
        }
    }
}

impl From<chart::ChartError> for ApiError {
    fn from(err: chart::ChartError) -> Self {
        ApiError::from(OrchestratorError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
