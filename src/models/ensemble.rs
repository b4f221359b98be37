//! The four target models loaded together, plus the merged category
//! vocabulary used to build one row that serves all of them.

use std::path::Path;
use tracing::info;

use crate::error::{ArtifactError, PredictionError};
use crate::features::{CategoryVocabulary, EngineeredFeatureRow};
use crate::models::bundle::{parse_bool_label, BundleInfo, Decoded, ModelBundle, Target};

/// Decoded predictions of all four targets for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleOutput {
    pub failure_in_30_days: bool,
    pub failure_type: String,
    pub risk_score: u8,
    pub recommended_action: String,
}

/// Immutable set of loaded bundles, one per [`Target`].
#[derive(Debug)]
pub struct ModelEnsemble {
    failure_30d: ModelBundle,
    failure_type: ModelBundle,
    risk_score: ModelBundle,
    recommended_action: ModelBundle,
    vocabulary: CategoryVocabulary,
}

impl ModelEnsemble {
    /// Combine four bundles; each must be for the slot it is passed in.
    pub fn new(
        failure_30d: ModelBundle,
        failure_type: ModelBundle,
        risk_score: ModelBundle,
        recommended_action: ModelBundle,
    ) -> Result<Self, ArtifactError> {
        let slots = [
            (Target::Failure30d, &failure_30d),
            (Target::FailureType, &failure_type),
            (Target::RiskScore, &risk_score),
            (Target::RecommendedAction, &recommended_action),
        ];
        let mut vocabulary = CategoryVocabulary::new();
        for (expected, bundle) in slots {
            if bundle.target() != expected {
                return Err(ArtifactError::SchemaMismatch {
                    target: expected.to_string(),
                    reason: format!("bundle for '{}' given in its place", bundle.target()),
                });
            }
            vocabulary.merge(bundle.schema().categories());
        }

        Ok(Self {
            failure_30d,
            failure_type,
            risk_score,
            recommended_action,
            vocabulary,
        })
    }

    /// Load every target from `<dir>/<target>/`.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let load = |target: Target| ModelBundle::load(&dir.join(target.as_str()), target);
        let ensemble = Self::new(
            load(Target::Failure30d)?,
            load(Target::FailureType)?,
            load(Target::RiskScore)?,
            load(Target::RecommendedAction)?,
        )?;

        for bundle in ensemble.bundles() {
            let meta = bundle.info();
            info!(
                target = %meta.target,
                kind = meta.kind,
                features = meta.feature_count,
                fingerprint = %meta.schema_fingerprint,
                "Loaded model"
            );
        }
        Ok(ensemble)
    }

    /// Union of every schema's category vocabulary.
    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    pub fn bundles(&self) -> [&ModelBundle; 4] {
        [
            &self.failure_30d,
            &self.failure_type,
            &self.risk_score,
            &self.recommended_action,
        ]
    }

    pub fn info(&self) -> Vec<BundleInfo> {
        self.bundles().iter().map(|b| b.info()).collect()
    }

    /// Run every target against `row`. Any failing target fails the whole
    /// prediction.
    pub fn predict(&self, row: &EngineeredFeatureRow) -> Result<EnsembleOutput, PredictionError> {
        let failure_label = class(&self.failure_30d, row)?;
        let failure_in_30_days = parse_bool_label(failure_label).ok_or_else(|| PredictionError::Inference {
            target: Target::Failure30d.to_string(),
            reason: format!("label '{failure_label}' is not a boolean"),
        })?;

        let risk_score = match self.risk_score.predict(row)? {
            Decoded::Score(score) => risk_from_score(score),
            Decoded::Class(label) => return Err(unexpected(Target::RiskScore, label)),
        };

        Ok(EnsembleOutput {
            failure_in_30_days,
            failure_type: class(&self.failure_type, row)?.to_string(),
            risk_score,
            recommended_action: class(&self.recommended_action, row)?.to_string(),
        })
    }
}

fn class<'a>(bundle: &'a ModelBundle, row: &EngineeredFeatureRow) -> Result<&'a str, PredictionError> {
    match bundle.predict(row)? {
        Decoded::Class(label) => Ok(label),
        Decoded::Score(score) => Err(unexpected(bundle.target(), &score.to_string())),
    }
}

fn unexpected(target: Target, got: &str) -> PredictionError {
    PredictionError::Inference {
        target: target.to_string(),
        reason: format!("unexpected output '{got}'"),
    }
}

/// Clamp to `[0, 100]` and truncate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn risk_from_score(score: f64) -> u8 {
    score.clamp(0.0, 100.0) as u8
}
