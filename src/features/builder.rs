//! Feature Builder
//!
//! Pure transform from a resolved request to the engineered feature row the
//! models were trained on. Column names here must match the training-time
//! names exactly; anything a schema does not list is dropped by the aligner.

use std::collections::BTreeMap;

use crate::config::defaults::{FEATURE_CLIP_LIMIT, OLD_ASSET_YEARS, RECENT_REPAIR_DAYS};
use crate::features::schema::{indicator_column, CategoryVocabulary};
use crate::resolve;
use crate::types::{AssetRecord, ResolvedContext};

/// Engineered features for one request, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineeredFeatureRow {
    values: BTreeMap<String, f64>,
}

impl EngineeredFeatureRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Store `value` after cleanup: non-finite becomes 0, then clipped.
    fn set(&mut self, column: impl Into<String>, value: f64) {
        self.values.insert(column.into(), sanitize(value));
    }
}

impl FromIterator<(String, f64)> for EngineeredFeatureRow {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut row = Self::default();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-FEATURE_CLIP_LIMIT, FEATURE_CLIP_LIMIT)
    } else {
        0.0
    }
}

/// Build the engineered row for `record` in `ctx`.
///
/// Categorical fields are expanded against `vocabulary` with drop-first
/// encoding; unseen values (and an unknown region) yield all-zero indicators.
#[allow(clippy::cast_precision_loss)]
pub fn build(ctx: &ResolvedContext, record: &AssetRecord, vocabulary: &CategoryVocabulary) -> EngineeredFeatureRow {
    let mut row = EngineeredFeatureRow::default();

    let days_since_repair = resolve::days_since_repair(record, ctx.snapshot_date);
    let asset_age = resolve::asset_age_years(record, ctx.snapshot_date) as f64;
    let length = record.length_m();
    let failures = f64::from(ctx.num_prev_failures);
    let (rain, moisture, slope, temp) = (ctx.rainfall_mm, ctx.soil_moisture_pc, ctx.slope_grade, ctx.temperature_c);

    // Raw copies
    row.set("latitude", ctx.latitude);
    row.set("longitude", ctx.longitude);
    row.set("avg_temp_c", temp);
    row.set("rainfall_mm", rain);
    row.set("soil_moisture_pc", moisture);
    row.set("slope_grade", slope);
    row.set("num_prev_failures", failures);
    row.set("install_year", f64::from(record.install_year));
    row.set("length_m", length);

    // Durations and flags
    row.set("days_since_repair", days_since_repair);
    row.set("asset_age_years", asset_age);
    row.set("recent_repair", flag(days_since_repair < RECENT_REPAIR_DAYS));
    row.set("old_asset", flag(asset_age > OLD_ASSET_YEARS));
    row.set("failures_prev", failures);

    // Environmental interactions
    let env_stress = 0.4 * rain + 0.6 * moisture;
    row.set("rain_stress", rain * slope);
    row.set("moisture_stress", moisture * slope);
    row.set("env_stress", env_stress);
    row.set("temp_stress", temp * slope);

    // Structural interactions
    let structural_risk = asset_age * length;
    row.set("structural_risk", structural_risk);
    row.set("length_age", length * asset_age);
    row.set("length_slope", length * slope);
    // ln(1 + d) is NaN for d < -1 (repair after snapshot); cleanup zeroes it.
    row.set("failure_pressure", failures * days_since_repair.ln_1p());
    row.set("age_length_slope", asset_age * length * slope);
    row.set("failures_env_stress", failures * env_stress);
    row.set("length_rain_stress", length * rain);
    row.set("moisture_age", moisture * asset_age);
    row.set("struct_env_pressure", structural_risk * env_stress);

    // Categorical expansion
    let categorical = [
        ("type", Some(record.asset_type.trim())),
        ("material", Some(record.material.trim())),
        ("soil_type", Some(record.soil_type.trim())),
        ("region", ctx.region.as_deref().map(str::trim)),
        ("traffic", Some(ctx.traffic_level.as_str())),
    ];
    for (field, value) in categorical {
        for category in vocabulary.encoded_categories(field) {
            row.set(indicator_column(field, category), flag(value == Some(category)));
        }
    }

    row
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}
