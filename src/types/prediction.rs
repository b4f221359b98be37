//! Combined per-asset decision returned to clients.

use serde::{Deserialize, Serialize};

/// Final decision assembled from the ensemble outputs plus derived priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub failure_in_30_days: bool,
    pub failure_type: String,
    /// 0-100
    pub risk_score: u8,
    pub recommended_action: String,
    /// 1 (lowest) to 5 (most urgent)
    pub priority: u8,
}
