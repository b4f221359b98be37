//! Failure-history proxy.
//!
//! Training rows carried a real `num_prev_failures` column; single-shot
//! requests cannot supply one, so it is estimated from age, material, soil,
//! repair recency and traffic. The rule must stay in lockstep with the one
//! the deployed models were validated against.

use crate::config::defaults::MAX_PREV_FAILURES;
use crate::types::TrafficLevel;

/// Degradation multiplier by pipe material; unknown materials are 1.0.
pub fn material_risk_factor(material: &str) -> f64 {
    match material.trim().to_ascii_lowercase().as_str() {
        "cast_iron" => 1.5,
        "concrete" => 1.3,
        "steel" => 1.2,
        "pvc" => 0.7,
        "hdpe" => 0.6,
        _ => 1.0,
    }
}

/// Corrosion multiplier by soil; unknown soils are 1.0.
pub fn soil_risk_factor(soil_type: &str) -> f64 {
    match soil_type.trim().to_ascii_lowercase().as_str() {
        "clay" => 1.4,
        "sandy" => 1.1,
        "loam" => 1.0,
        "rocky" => 0.9,
        _ => 1.0,
    }
}

/// Inputs to [`estimate_prev_failures`].
#[derive(Debug, Clone, Copy)]
pub struct HistoryInputs<'a> {
    pub material: &'a str,
    pub soil_type: &'a str,
    pub asset_age_years: i64,
    pub days_since_repair: f64,
    pub traffic: TrafficLevel,
}

/// Estimated historical failure count, in `[0, MAX_PREV_FAILURES]`.
#[allow(clippy::cast_possible_truncation)]
pub fn estimate_prev_failures(inputs: &HistoryInputs<'_>) -> u32 {
    let mat = material_risk_factor(inputs.material);
    let soil = soil_risk_factor(inputs.soil_type);
    let age = inputs.asset_age_years;

    // Each band truncates toward zero, as the training-time estimate did.
    let mut failures: i64 = if age > 50 {
        (12.0 + 3.0 * mat + 2.0 * soil) as i64
    } else if age > 40 {
        (9.0 + 2.0 * mat + soil) as i64
    } else if age > 30 {
        (6.0 + 1.5 * mat) as i64
    } else if age > 20 {
        (3.0 + mat) as i64
    } else if age > 10 {
        (1.0 + 0.5 * mat) as i64
    } else {
        0
    };

    let days = inputs.days_since_repair;
    if days > 365.0 * 7.0 {
        failures += 3;
    } else if days > 365.0 * 5.0 {
        failures += 2;
    } else if days > 365.0 * 3.0 {
        failures += 1;
    }

    if inputs.traffic == TrafficLevel::High && soil > 1.2 {
        failures += 2;
    }

    failures.clamp(0, MAX_PREV_FAILURES) as u32
}
