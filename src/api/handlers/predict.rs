//! Prediction endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::error;

use crate::api::envelope::ApiError;
use crate::types::{AssetRecord, PredictionResult};

use super::ApiState;

/// POST /predict - Score one asset record
///
/// Body and validation failures answer 422 before any model runs. Schema or
/// inference failures answer 500; no partial result is returned.
pub async fn predict(
    State(state): State<ApiState>,
    body: Result<Json<AssetRecord>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(record) = body?;

    match state.service.predict(&record).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if !e.is_client_error() {
                error!(error = %e, "Prediction failed");
            }
            Err(ApiError::from(&e))
        }
    }
}
