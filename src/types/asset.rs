//! Raw asset input and the per-request context resolved from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::defaults::DEFAULT_LENGTH_M;

fn default_length_m() -> Option<f64> {
    Some(DEFAULT_LENGTH_M)
}

/// Raw asset attributes as submitted by a client.
///
/// At least one of `region` or `exact_location` must be present; this is
/// checked by [`crate::resolve::validate_record`] before any feature work starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Asset kind, e.g. `pipe`, `pump`, `streetlight`
    #[serde(rename = "type")]
    pub asset_type: String,
    pub material: String,
    #[serde(default)]
    pub region: Option<String>,
    pub soil_type: String,
    /// `[latitude, longitude]`
    #[serde(default)]
    pub exact_location: Option<(f64, f64)>,
    /// Free-form date string; unparseable values are tolerated downstream
    pub last_repair_date: String,
    /// `%Y-%m-%d`; defaults to today when absent
    #[serde(default)]
    pub snapshot_date: Option<String>,
    pub install_year: i32,
    #[serde(default = "default_length_m")]
    pub length_m: Option<f64>,
}

impl AssetRecord {
    /// Asset length with the request default applied.
    pub fn length_m(&self) -> f64 {
        self.length_m.unwrap_or(DEFAULT_LENGTH_M)
    }

    /// Region name with surrounding whitespace removed, `None` if blank.
    pub fn region_name(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Traffic exposure tier of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    High,
    Medium,
    Low,
}

impl TrafficLevel {
    /// Category string used in the training data.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficLevel::High => "high",
            TrafficLevel::Medium => "medium",
            TrafficLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete values resolved for one request before feature construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContext {
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when coordinates fall outside every known region
    pub region: Option<String>,
    pub traffic_level: TrafficLevel,
    pub temperature_c: f64,
    pub snapshot_date: NaiveDate,
    pub rainfall_mm: f64,
    pub soil_moisture_pc: f64,
    pub slope_grade: f64,
    /// Estimated count of past failures (see `resolve::history`)
    pub num_prev_failures: u32,
}
