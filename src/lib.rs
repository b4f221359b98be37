//! TunnelVision: infrastructure asset failure-risk scoring
//!
//! Turns a loosely specified asset record into the exact feature rows a set
//! of independently trained models expect, runs those models and derives
//! one coherent decision from their outputs.
//!
//! ## Architecture
//!
//! - **Context Resolution** (`resolve`): location, region, traffic, weather
//!   and failure-history proxy
//! - **Feature pipeline** (`features`): schema registry, builder, aligner
//! - **Model Ensemble** (`models`): per-target bundles and priority rule
//! - **Orchestrator** (`pipeline`): record in, [`PredictionResult`] out
//! - **HTTP adapter** (`api`): axum router over the orchestrator

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod resolve;
pub mod types;

// Re-export configuration
pub use config::ServiceConfig;

// Re-export commonly used types
pub use error::{ArtifactError, PredictionError, ValidationError};
pub use types::{AssetRecord, PredictionResult, ResolvedContext, TrafficLevel};

// Re-export the prediction path
pub use features::{CategoryVocabulary, FeatureSchema};
pub use models::{ModelBundle, ModelEnsemble, Target};
pub use pipeline::PredictionService;
