//! Model bundles: one trained predictor, its feature schema and its output
//! decoding, checked for consistency when loaded.
//!
//! On disk a bundle is a directory holding `schema.json` and `model.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{ArtifactError, PredictionError};
use crate::features::{align, EngineeredFeatureRow, FeatureSchema};
use crate::models::predictor::{InferenceFault, Predictor, PredictorSpec};

/// On-disk model format understood by this build.
pub const MODEL_FORMAT_VERSION: u32 = 1;

pub const SCHEMA_FILE: &str = "schema.json";
pub const MODEL_FILE: &str = "model.json";

/// Prediction targets, one trained model each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[serde(rename = "failure_30d")]
    Failure30d,
    FailureType,
    RiskScore,
    RecommendedAction,
}

impl Target {
    pub const ALL: [Target; 4] = [
        Target::Failure30d,
        Target::FailureType,
        Target::RiskScore,
        Target::RecommendedAction,
    ];

    /// Artifact directory and log name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Failure30d => "failure_30d",
            Target::FailureType => "failure_type",
            Target::RiskScore => "risk_score",
            Target::RecommendedAction => "recommended_action",
        }
    }

    pub fn is_regression(&self) -> bool {
        matches!(self, Target::RiskScore)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub format_version: u32,
    pub target: String,
    /// Fingerprint of the schema the model was trained against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_fingerprint: Option<u32>,
    /// Class labels in output order; empty for the regressor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Per-class divisors applied to probabilities before argmax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_thresholds: Option<Vec<f64>>,
    pub predictor: PredictorSpec,
}

/// How a bundle's output vector becomes a label or score.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputDecoder {
    Score,
    Class {
        labels: Vec<String>,
        thresholds: Option<Vec<f64>>,
    },
}

/// Decoded output of one bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<'a> {
    Score(f64),
    Class(&'a str),
}

/// Per-bundle metadata reported by `GET /models`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleInfo {
    pub target: Target,
    pub kind: &'static str,
    pub feature_count: usize,
    /// Hex CRC-32 of the schema column layout.
    pub schema_fingerprint: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A trained predictor bound to the schema it was fitted on.
#[derive(Debug)]
pub struct ModelBundle {
    target: Target,
    schema: FeatureSchema,
    predictor: Box<dyn Predictor>,
    decoder: OutputDecoder,
}

impl ModelBundle {
    /// Assemble a bundle, rejecting any predictor/schema/decoder disagreement.
    ///
    /// `trained_fingerprint` is the schema fingerprint recorded with the
    /// model, when the exporter recorded one.
    pub fn new(
        target: Target,
        schema: FeatureSchema,
        predictor: Box<dyn Predictor>,
        decoder: OutputDecoder,
        trained_fingerprint: Option<u32>,
    ) -> Result<Self, ArtifactError> {
        let name = target.as_str().to_string();
        let mismatch = |reason: String| ArtifactError::SchemaMismatch {
            target: name.clone(),
            reason,
        };
        let invalid = |reason: String| ArtifactError::InvalidModel {
            target: name.clone(),
            reason,
        };

        if schema.target() != target.as_str() {
            return Err(mismatch(format!("schema is for '{}'", schema.target())));
        }
        if predictor.n_features() != schema.len() {
            return Err(mismatch(format!(
                "model expects {} features, schema has {} columns",
                predictor.n_features(),
                schema.len()
            )));
        }
        if let Some(fp) = trained_fingerprint {
            if fp != schema.fingerprint() {
                return Err(mismatch(format!(
                    "model trained on layout {fp:08x}, schema is {:08x}",
                    schema.fingerprint()
                )));
            }
        }

        let width = predictor.n_outputs();
        match (&decoder, target.is_regression()) {
            (OutputDecoder::Score, true) => {
                if width != 1 {
                    return Err(invalid(format!("regressor must have 1 output, has {width}")));
                }
            }
            (OutputDecoder::Class { labels, thresholds }, false) => {
                if labels.len() < 2 {
                    return Err(invalid("classifier needs at least 2 labels".to_string()));
                }
                if labels.len() != width {
                    return Err(invalid(format!("{} labels for {width} outputs", labels.len())));
                }
                let mut seen = HashSet::new();
                if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
                    return Err(invalid(format!("duplicate label '{dup}'")));
                }
                if let Some(t) = thresholds {
                    if t.len() != labels.len() {
                        return Err(invalid(format!("{} thresholds for {} labels", t.len(), labels.len())));
                    }
                    if t.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                        return Err(invalid("thresholds must be positive and finite".to_string()));
                    }
                }
                if target == Target::Failure30d {
                    if let Some(bad) = labels.iter().find(|l| parse_bool_label(l).is_none()) {
                        return Err(invalid(format!("label '{bad}' is not a boolean")));
                    }
                }
            }
            (OutputDecoder::Score, false) => return Err(invalid("classifier target has no labels".to_string())),
            (OutputDecoder::Class { .. }, true) => return Err(invalid("regression target has labels".to_string())),
        }

        Ok(Self {
            target,
            schema,
            predictor,
            decoder,
        })
    }

    /// Load `<dir>/schema.json` and `<dir>/model.json` for `target`.
    pub fn load(dir: &Path, target: Target) -> Result<Self, ArtifactError> {
        let schema = FeatureSchema::load(&dir.join(SCHEMA_FILE))?;

        let path = dir.join(MODEL_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| ArtifactError::Io(path.clone(), e))?;
        let file: ModelFile = serde_json::from_str(&raw).map_err(|e| ArtifactError::Json(path.clone(), e))?;

        let invalid = |reason: String| ArtifactError::InvalidModel {
            target: target.as_str().to_string(),
            reason,
        };
        if file.format_version != MODEL_FORMAT_VERSION {
            return Err(invalid(format!(
                "unsupported format_version {} (expected {MODEL_FORMAT_VERSION})",
                file.format_version
            )));
        }
        if file.target != target.as_str() {
            return Err(invalid(format!("model file is for '{}'", file.target)));
        }

        let predictor = file.predictor.into_predictor().map_err(invalid)?;
        let decoder = if target.is_regression() && file.labels.is_empty() {
            OutputDecoder::Score
        } else {
            OutputDecoder::Class {
                labels: file.labels,
                thresholds: file.decision_thresholds,
            }
        };

        let bundle = Self::new(target, schema, predictor, decoder, file.schema_fingerprint)?;
        debug!(
            target = %target,
            kind = bundle.predictor.kind(),
            features = bundle.schema.len(),
            fingerprint = %format!("{:08x}", bundle.schema.fingerprint()),
            "Model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            target: self.target,
            kind: self.predictor.kind(),
            feature_count: self.schema.len(),
            schema_fingerprint: format!("{:08x}", self.schema.fingerprint()),
            labels: match &self.decoder {
                OutputDecoder::Score => Vec::new(),
                OutputDecoder::Class { labels, .. } => labels.clone(),
            },
        }
    }

    /// Align `row` to this bundle's schema, run the predictor and decode.
    pub fn predict(&self, row: &EngineeredFeatureRow) -> Result<Decoded<'_>, PredictionError> {
        let aligned = align(row, &self.schema);
        if aligned.filled() > 0 {
            debug!(target = %self.target, filled = aligned.filled(), "Schema columns absent from row, filled with 0");
        }

        let output = self.predictor.predict(aligned.values()).map_err(|fault| match fault {
            InferenceFault::Shape { expected, actual } => PredictionError::SchemaMismatch {
                target: self.target.to_string(),
                expected,
                actual,
            },
            InferenceFault::NonFinite => self.inference_error(fault.to_string()),
        })?;

        match &self.decoder {
            OutputDecoder::Score => match output.as_slice() {
                [score] => Ok(Decoded::Score(*score)),
                _ => Err(self.inference_error(format!("expected 1 output, got {}", output.len()))),
            },
            OutputDecoder::Class { labels, thresholds } => {
                if output.len() != labels.len() {
                    return Err(self.inference_error(format!(
                        "expected {} class probabilities, got {}",
                        labels.len(),
                        output.len()
                    )));
                }
                let idx = argmax_with_thresholds(&output, thresholds.as_deref());
                Ok(Decoded::Class(&labels[idx]))
            }
        }
    }

    fn inference_error(&self, reason: String) -> PredictionError {
        PredictionError::Inference {
            target: self.target.to_string(),
            reason,
        }
    }
}

/// Index of the largest `p[i] / t[i]`; the first index wins ties.
pub fn argmax_with_thresholds(probs: &[f64], thresholds: Option<&[f64]>) -> usize {
    let adjusted = |i: usize| thresholds.map_or(probs[i], |t| probs[i] / t[i]);
    (1..probs.len()).fold(0, |best, i| if adjusted(i) > adjusted(best) { i } else { best })
}

/// Parse a failure-flag class label (`1`/`0`/`true`/`false`).
pub fn parse_bool_label(label: &str) -> Option<bool> {
    match label.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}
