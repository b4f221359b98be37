//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` over the
//! shipped demo artifacts and exercise every endpoint using
//! `tower::ServiceExt::oneshot()`. No binary spawn, no network port.

use tunnelvision::api::{create_app, ApiState};
use tunnelvision::models::ModelEnsemble;
use tunnelvision::resolve::weather::FixedTemperature;
use tunnelvision::PredictionService;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app() -> Router {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts");
    let ensemble = ModelEnsemble::load(&dir).unwrap();
    let service = PredictionService::new(Arc::new(ensemble), Arc::new(FixedTemperature(15.0)));
    create_app(ApiState::new(service), &[])
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const SANTA_CLARA: &str = r#"{
    "type": "pipe",
    "material": "cast_iron",
    "region": "Santa Clara",
    "soil_type": "clay",
    "last_repair_date": "2015-01-01",
    "snapshot_date": "2024-01-01",
    "install_year": 1980,
    "length_m": 150.0
}"#;

/// POST /predict returns the bare decision object.
#[tokio::test]
async fn test_predict_returns_decision() {
    let resp = create_test_app().oneshot(post_json("/predict", SANTA_CLARA)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["failure_in_30_days"], true);
    assert_eq!(json["failure_type"], "structural_damage");
    assert_eq!(json["risk_score"], 81);
    assert_eq!(json["recommended_action"], "replace");
    assert_eq!(json["priority"], 5);
    assert_eq!(json.as_object().unwrap().len(), 5);
}

/// Coordinates alone are enough.
#[tokio::test]
async fn test_predict_with_exact_location_only() {
    let body = r#"{
        "type": "hydrant",
        "material": "steel",
        "soil_type": "sandy",
        "exact_location": [37.715, -122.4285],
        "last_repair_date": "2022-03-15",
        "snapshot_date": "2024-01-01",
        "install_year": 2001
    }"#;
    let resp = create_test_app().oneshot(post_json("/predict", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let priority = json["priority"].as_u64().unwrap();
    assert!((1..=5).contains(&priority));
}

/// Neither region nor exact_location: 422 in the error envelope.
#[tokio::test]
async fn test_predict_without_location_is_422() {
    let body = r#"{
        "type": "pipe",
        "material": "pvc",
        "soil_type": "loam",
        "last_repair_date": "2020-01-01",
        "install_year": 2001
    }"#;
    let resp = create_test_app().oneshot(post_json("/predict", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(resp).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["message"], "Either exact_location or region must be provided");
    assert!(json["meta"]["timestamp"].is_string());
}

/// Structurally malformed bodies are 422 with the same envelope.
#[tokio::test]
async fn test_predict_malformed_body_is_422() {
    for body in [
        "{not json",
        r#"{"type": "pipe"}"#,
        r#"{"type": "pipe", "material": "pvc", "region": "Napa", "soil_type": "loam",
            "last_repair_date": "2020-01-01", "install_year": "nineteen"}"#,
    ] {
        let resp = create_test_app().oneshot(post_json("/predict", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }
}

/// Bad snapshot date and non-positive length are rejected before inference.
#[tokio::test]
async fn test_predict_invalid_fields_are_422() {
    let bad_date = SANTA_CLARA.replace("2024-01-01", "someday");
    let resp = create_test_app().oneshot(post_json("/predict", &bad_date)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_length = SANTA_CLARA.replace("150.0", "-3.0");
    let resp = create_test_app().oneshot(post_json("/predict", &bad_length)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// GET /health reports the schema layout served for each target.
#[tokio::test]
async fn test_health_reports_schema_fingerprints() {
    let resp = create_test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["requests"]["served"], 0);

    let schemas = &json["data"]["schemas"];
    assert_eq!(schemas.as_object().unwrap().len(), 4);
    assert_eq!(schemas["failure_30d"], "1ef7b4a2");
    assert_eq!(schemas["failure_type"], "77da01bf");
    assert_eq!(schemas["risk_score"], "b9c0ce26");
    assert_eq!(schemas["recommended_action"], "f1817aa4");
}

/// Health counters move with traffic.
#[tokio::test]
async fn test_health_counts_requests() {
    let app = create_test_app();
    let resp = app.clone().oneshot(post_json("/predict", SANTA_CLARA)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.clone().oneshot(post_json("/predict", r#"{"type": "pipe", "material": "pvc",
        "soil_type": "loam", "last_repair_date": "2020-01-01", "install_year": 2001}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["data"]["requests"]["served"], 1);
    assert_eq!(json["data"]["requests"]["rejected"], 1);
}

/// GET /models lists one entry per target with its schema fingerprint.
#[tokio::test]
async fn test_models_lists_every_target() {
    let resp = create_test_app().oneshot(get("/models")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;

    let models = json["data"].as_array().unwrap();
    let targets: Vec<&str> = models.iter().map(|m| m["target"].as_str().unwrap()).collect();
    assert_eq!(targets, ["failure_30d", "failure_type", "risk_score", "recommended_action"]);

    for m in models {
        assert_eq!(m["schema_fingerprint"].as_str().unwrap().len(), 8);
        assert!(m["feature_count"].as_u64().unwrap() > 0);
    }
    assert_eq!(models[2]["kind"], "tree_ensemble");
    assert!(models[2].get("labels").is_none());
    assert_eq!(models[0]["labels"], serde_json::json!(["0", "1"]));
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let resp = create_test_app().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_predict_rejects_get() {
    let resp = create_test_app().oneshot(get("/predict")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
