//! Model Ensemble
//!
//! Independently trained predictors, one per target, each bound to the
//! feature schema it was trained against. Loading is an explicit startup
//! step; the resulting [`ModelEnsemble`] is immutable and shared by `Arc`.

pub mod bundle;
pub mod ensemble;
pub mod predictor;
pub mod priority;

pub use bundle::{BundleInfo, ModelBundle, ModelFile, OutputDecoder, Target};
pub use ensemble::{EnsembleOutput, ModelEnsemble};
pub use predictor::{Predictor, PredictorSpec};
pub use priority::priority_for_risk;
