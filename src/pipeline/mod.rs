//! Request pipeline: record in, decision out.

mod orchestrator;

pub use orchestrator::{PredictionService, PredictionStats};
