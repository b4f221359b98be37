//! API route handlers
//!
//! - `POST /predict`: asset record in, decision out
//! - `GET /health`: liveness, schema fingerprints and request counters
//! - `GET /models`: per-target bundle metadata

mod predict;
mod status;

pub use predict::*;
pub use status::*;

use std::sync::Arc;

use crate::pipeline::PredictionService;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PredictionService>,
}

impl ApiState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
