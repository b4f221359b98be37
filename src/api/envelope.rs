//! Wire shapes of the HTTP adapter.
//!
//! A successful `POST /predict` answers the bare
//! [`PredictionResult`](crate::types::PredictionResult), so clients read the
//! five decision fields at the top level. The status endpoints wrap their
//! payload as `{ "data": T, "meta": { .. } }`. Every failure on any route is
//! `{ "error": { "code", "message" }, "meta": { .. } }`, with the HTTP status
//! fixed by its [`ErrorCode`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::error::PredictionError;

/// When and by which build a response was produced.
#[derive(Debug, Serialize)]
pub struct Meta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Meta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Status payload stamped with [`Meta`].
#[derive(Debug, Serialize)]
pub struct Enveloped<T> {
    pub data: T,
    pub meta: Meta,
}

impl<T: Serialize> Enveloped<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: Meta::now() }
    }
}

impl<T: Serialize> IntoResponse for Enveloped<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Machine-readable failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Body malformed or record rejected before any model ran.
    ValidationError,
    /// Aligned row and loaded model disagree on layout.
    SchemaMismatch,
    /// A model produced unusable output.
    InferenceError,
    NotFound,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::SchemaMismatch | ErrorCode::InferenceError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

/// Failure body; converts straight into a response with the code's status.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorDetail,
    pub meta: Meta,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
            meta: Meta::now(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.error.code.status(), Json(self)).into_response()
    }
}

impl From<&PredictionError> for ApiError {
    fn from(err: &PredictionError) -> Self {
        let code = match err {
            PredictionError::Validation(_) => ErrorCode::ValidationError,
            PredictionError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            PredictionError::Inference { .. } => ErrorCode::InferenceError,
        };
        Self::new(code, err.to_string())
    }
}

// Syntax, content-type and missing-field problems alike are unprocessable input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorCode::ValidationError, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    async fn json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_enveloped_shape() {
        let resp = Enveloped::new(serde_json::json!({"status": "ok"})).into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let v = json(resp).await;
        assert_eq!(v["data"]["status"], "ok");
        assert_eq!(v["meta"]["version"], env!("CARGO_PKG_VERSION"));
        assert!(v["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_validation_failure_is_422() {
        let err = PredictionError::from(ValidationError::MissingLocation);
        let resp = ApiError::from(&err).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let v = json(resp).await;
        assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(v["error"]["message"], "Either exact_location or region must be provided");
        assert!(v["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_model_faults_are_500_with_distinct_codes() {
        let mismatch = PredictionError::SchemaMismatch {
            target: "risk_score".to_string(),
            expected: 48,
            actual: 47,
        };
        let resp = ApiError::from(&mismatch).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(resp).await["error"]["code"], "SCHEMA_MISMATCH");

        let inference = PredictionError::Inference {
            target: "failure_type".to_string(),
            reason: "non-finite output".to_string(),
        };
        let err = ApiError::from(&inference);
        assert_eq!(err.code(), ErrorCode::InferenceError);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        let resp = ApiError::new(ErrorCode::NotFound, "No route for /x").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
