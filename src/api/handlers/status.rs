//! Service state endpoints: health and loaded models

use axum::extract::State;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::api::envelope::Enveloped;
use crate::models::BundleInfo;
use crate::pipeline::PredictionStats;

use super::ApiState;

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Target name to hex layout fingerprint of the schema being served.
    pub schemas: BTreeMap<&'static str, String>,
    pub requests: PredictionStats,
}

/// GET /health - Liveness, served schema layouts and request counters
pub async fn get_health(State(state): State<ApiState>) -> Enveloped<HealthResponse> {
    let schemas = state
        .service
        .ensemble()
        .bundles()
        .iter()
        .map(|b| (b.target().as_str(), format!("{:08x}", b.schema().fingerprint())))
        .collect();

    Enveloped::new(HealthResponse {
        status: "ok",
        schemas,
        requests: state.service.stats(),
    })
}

// ============================================================================
// Models Endpoint
// ============================================================================

/// GET /models - Kind, feature count, fingerprint and labels per target
pub async fn get_models(State(state): State<ApiState>) -> Enveloped<Vec<BundleInfo>> {
    Enveloped::new(state.service.ensemble().info())
}
