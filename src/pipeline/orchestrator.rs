//! Prediction Orchestrator
//!
//! ```text
//! STEP 1: Validate record (location disjunction, coordinates, length)
//! STEP 2: Resolve context (location, region, traffic, weather, history proxy)
//! STEP 3: Build one engineered row against the merged vocabulary
//! STEP 4: Align + predict per target (Model Ensemble)
//! STEP 5: Derive priority from the risk score
//! ```
//!
//! Requests are independent; the only shared state is the immutable
//! ensemble and the weather client.

use chrono::{Local, NaiveDate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::PredictionError;
use crate::features;
use crate::models::{priority_for_risk, ModelEnsemble};
use crate::resolve::{self, weather::WeatherLookup};
use crate::types::{AssetRecord, PredictionResult};

/// Request counters since startup.
#[derive(Debug, Default)]
struct Counters {
    served: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of the request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PredictionStats {
    pub served: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Runs the full record-to-decision path against one loaded ensemble.
pub struct PredictionService {
    ensemble: Arc<ModelEnsemble>,
    weather: Arc<dyn WeatherLookup>,
    counters: Counters,
}

impl PredictionService {
    pub fn new(ensemble: Arc<ModelEnsemble>, weather: Arc<dyn WeatherLookup>) -> Self {
        Self {
            ensemble,
            weather,
            counters: Counters::default(),
        }
    }

    pub fn ensemble(&self) -> &ModelEnsemble {
        &self.ensemble
    }

    pub fn stats(&self) -> PredictionStats {
        PredictionStats {
            served: self.counters.served.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Predict with today's local date as the default snapshot date.
    pub async fn predict(&self, record: &AssetRecord) -> Result<PredictionResult, PredictionError> {
        self.predict_on(record, Local::now().date_naive()).await
    }

    /// Predict with `today` as the default snapshot date. Deterministic for a
    /// given record, date and weather answer.
    pub async fn predict_on(&self, record: &AssetRecord, today: NaiveDate) -> Result<PredictionResult, PredictionError> {
        let result = self.run(record, today).await;
        match &result {
            Ok(_) => self.counters.served.fetch_add(1, Ordering::Relaxed),
            Err(e) if e.is_client_error() => {
                debug!(error = %e, "Prediction request rejected");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed)
            }
            Err(e) => {
                warn!(error = %e, "Prediction failed");
                self.counters.failed.fetch_add(1, Ordering::Relaxed)
            }
        };
        result
    }

    async fn run(&self, record: &AssetRecord, today: NaiveDate) -> Result<PredictionResult, PredictionError> {
        let started = Instant::now();

        // STEP 1-2
        let ctx = resolve::resolve_context(record, today, self.weather.as_ref()).await?;

        // STEP 3
        let row = features::build(&ctx, record, self.ensemble.vocabulary());

        // STEP 4
        let out = self.ensemble.predict(&row)?;

        // STEP 5
        let priority = priority_for_risk(out.risk_score);

        info!(
            region = ctx.region.as_deref().unwrap_or("unknown"),
            traffic = %ctx.traffic_level,
            prev_failures = ctx.num_prev_failures,
            risk_score = out.risk_score,
            priority,
            failure_in_30_days = out.failure_in_30_days,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction complete"
        );

        Ok(PredictionResult {
            failure_in_30_days: out.failure_in_30_days,
            failure_type: out.failure_type,
            risk_score: out.risk_score,
            recommended_action: out.recommended_action,
            priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::features::{CategoryVocabulary, FeatureSchema};
    use crate::models::predictor::{ConstantModel, LinearModel, Link};
    use crate::models::{ModelBundle, OutputDecoder, Target};
    use crate::resolve::weather::FixedTemperature;

    fn classifier(target: Target, labels: &[&str], output: Vec<f64>) -> ModelBundle {
        let schema = FeatureSchema::new(target.as_str(), vec!["length_m".into()], CategoryVocabulary::new()).unwrap();
        ModelBundle::new(
            target,
            schema,
            Box::new(ConstantModel { n_features: 1, output }),
            OutputDecoder::Class {
                labels: labels.iter().map(|s| s.to_string()).collect(),
                thresholds: None,
            },
            None,
        )
        .unwrap()
    }

    /// Risk = 0.5 * num_prev_failures + 2 when the region is Santa Clara.
    fn risk_model() -> ModelBundle {
        let mut vocab = CategoryVocabulary::new();
        vocab.insert("region", ["Alameda", "Santa Clara"]);
        let schema = FeatureSchema::new(
            "risk_score",
            vec!["num_prev_failures".into(), "region_Santa Clara".into()],
            vocab,
        )
        .unwrap();
        let model = LinearModel {
            weights: vec![vec![0.5, 2.0]],
            intercepts: vec![0.0],
            link: Link::Identity,
        };
        ModelBundle::new(Target::RiskScore, schema, Box::new(model), OutputDecoder::Score, None).unwrap()
    }

    fn service() -> PredictionService {
        let ensemble = ModelEnsemble::new(
            classifier(Target::Failure30d, &["false", "true"], vec![0.9, 0.1]),
            classifier(Target::FailureType, &["corrosion", "crack"], vec![0.4, 0.6]),
            risk_model(),
            classifier(Target::RecommendedAction, &["inspect", "replace"], vec![0.7, 0.3]),
        )
        .unwrap();
        PredictionService::new(Arc::new(ensemble), Arc::new(FixedTemperature(15.0)))
    }

    fn record() -> AssetRecord {
        AssetRecord {
            asset_type: "pipe".to_string(),
            material: "cast_iron".to_string(),
            region: Some("Santa Clara".to_string()),
            soil_type: "clay".to_string(),
            exact_location: None,
            last_repair_date: "2015-01-01".to_string(),
            snapshot_date: Some("2024-01-01".to_string()),
            install_year: 1980,
            length_m: Some(150.0),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_result() {
        let svc = service();
        let result = svc.predict_on(&record(), today()).await.unwrap();
        // 18 * 0.5 + 2 = 11
        assert_eq!(
            result,
            PredictionResult {
                failure_in_30_days: false,
                failure_type: "crack".to_string(),
                risk_score: 11,
                recommended_action: "inspect".to_string(),
                priority: 1,
            }
        );
        assert_eq!(svc.stats().served, 1);
    }

    #[tokio::test]
    async fn test_validation_error_counts_as_rejected() {
        let svc = service();
        let mut r = record();
        r.region = None;
        let err = svc.predict_on(&r, today()).await.unwrap_err();
        assert!(matches!(err, PredictionError::Validation(ValidationError::MissingLocation)));
        assert_eq!(
            svc.stats(),
            PredictionStats {
                served: 0,
                rejected: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let svc = service();
        let a = svc.predict_on(&record(), today()).await.unwrap();
        let b = svc.predict_on(&record(), today()).await.unwrap();
        assert_eq!(a, b);
    }
}
