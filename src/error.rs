//! Error taxonomy for the prediction path.
//!
//! Input problems fail fast as [`ValidationError`]. Lookup problems never
//! show up here; they resolve to documented defaults inside `resolve`.
//! Schema/model inconsistencies are surfaced and never masked.

use std::path::PathBuf;
use thiserror::Error;

/// Client input is malformed. No model is invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Either exact_location or region must be provided")]
    MissingLocation,

    #[error("exact_location ({lat}, {lon}) is not a valid coordinate")]
    InvalidLocation { lat: f64, lon: f64 },

    #[error("snapshot_date '{0}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidSnapshotDate(String),

    #[error("length_m must be a positive finite number, got {0}")]
    InvalidLength(f64),
}

/// Any failure of a single prediction request.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Aligned row and model disagree on shape; a deployment inconsistency.
    #[error("Schema mismatch for {target}: model expects {expected} features, row has {actual}")]
    SchemaMismatch {
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("Inference failed for {target}: {reason}")]
    Inference { target: String, reason: String },
}

impl PredictionError {
    /// True when the caller sent bad input (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictionError::Validation(_))
    }
}

/// A schema or model artifact could not be loaded or is inconsistent.
///
/// Raised at startup; the service refuses to serve with a bad artifact set.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Artifact JSON error ({}): {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Invalid feature schema for {target}: {reason}")]
    InvalidSchema { target: String, reason: String },

    #[error("Invalid model for {target}: {reason}")]
    InvalidModel { target: String, reason: String },

    /// Model and schema were not trained together.
    #[error("Schema mismatch for {target}: {reason}")]
    SchemaMismatch { target: String, reason: String },
}
