//! Context Resolution
//!
//! Turns the optional parts of an [`AssetRecord`] into concrete values
//! before feature construction:
//!
//! 1. Location: explicit coordinates, else the region's gazetteer entry
//! 2. Region: explicit name, else reverse lookup from coordinates (may stay unknown)
//! 3. Traffic, temperature, snapshot date and site conditions
//! 4. Estimated failure history
//!
//! Only missing or malformed input is an error here. Lookup misses resolve
//! to documented defaults.

pub mod dates;
pub mod gazetteer;
pub mod history;
pub mod weather;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::defaults::UNKNOWN_REPAIR_DAYS;
use crate::error::ValidationError;
use crate::types::{AssetRecord, ResolvedContext};
use history::HistoryInputs;
use weather::WeatherLookup;

/// Input checks that must pass before any lookup or model work.
pub fn validate_record(record: &AssetRecord) -> Result<(), ValidationError> {
    match (record.exact_location, record.region_name()) {
        (None, None) => return Err(ValidationError::MissingLocation),
        (Some((lat, lon)), _) => {
            let valid = lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon);
            if !valid {
                return Err(ValidationError::InvalidLocation { lat, lon });
            }
        }
        (None, Some(_)) => {}
    }

    let length = record.length_m();
    if !length.is_finite() || length <= 0.0 {
        return Err(ValidationError::InvalidLength(length));
    }

    Ok(())
}

/// Snapshot date from the record, or `today` when absent.
pub fn resolve_snapshot_date(record: &AssetRecord, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    match record.snapshot_date.as_deref().map(str::trim) {
        None | Some("") => Ok(today),
        Some(raw) => {
            dates::parse_date(raw).ok_or_else(|| ValidationError::InvalidSnapshotDate(raw.to_string()))
        }
    }
}

/// Days between last repair and snapshot, or the out-of-range sentinel
/// when the repair date cannot be parsed.
#[allow(clippy::cast_precision_loss)]
pub fn days_since_repair(record: &AssetRecord, snapshot: NaiveDate) -> f64 {
    match dates::parse_date(&record.last_repair_date) {
        Some(repaired) => dates::days_between(repaired, snapshot) as f64,
        None => {
            debug!(raw = %record.last_repair_date, "Unparseable last_repair_date, using sentinel");
            UNKNOWN_REPAIR_DAYS
        }
    }
}

/// Asset age in whole years at the snapshot date, never negative.
pub fn asset_age_years(record: &AssetRecord, snapshot: NaiveDate) -> i64 {
    use chrono::Datelike;
    (i64::from(snapshot.year()) - i64::from(record.install_year)).max(0)
}

/// Resolve every derived input for one request.
pub async fn resolve_context(
    record: &AssetRecord,
    today: NaiveDate,
    weather: &dyn WeatherLookup,
) -> Result<ResolvedContext, ValidationError> {
    validate_record(record)?;
    let snapshot_date = resolve_snapshot_date(record, today)?;

    // 1-2. Location and region
    let (latitude, longitude, region) = match (record.exact_location, record.region_name()) {
        (Some((lat, lon)), Some(name)) => (lat, lon, Some(name.to_string())),
        (Some((lat, lon)), None) => {
            let region = gazetteer::region_for_coordinates(lat, lon).map(str::to_string);
            if region.is_none() {
                debug!(lat, lon, "Coordinates outside every known region");
            }
            (lat, lon, region)
        }
        (None, Some(name)) => {
            let (lat, lon) = gazetteer::coordinates_for_region(name);
            (lat, lon, Some(name.to_string()))
        }
        (None, None) => return Err(ValidationError::MissingLocation),
    };

    // 3. Derived context
    let traffic_level = gazetteer::traffic_level_for_region(region.as_deref());
    let temperature_c = weather.temperature_c(latitude, longitude).await;
    let env = gazetteer::environment_profile(region.as_deref(), &record.soil_type);

    // 4. Failure history proxy
    let num_prev_failures = history::estimate_prev_failures(&HistoryInputs {
        material: &record.material,
        soil_type: &record.soil_type,
        asset_age_years: asset_age_years(record, snapshot_date),
        days_since_repair: days_since_repair(record, snapshot_date),
        traffic: traffic_level,
    });

    Ok(ResolvedContext {
        latitude,
        longitude,
        region,
        traffic_level,
        temperature_c,
        snapshot_date,
        rainfall_mm: env.rainfall_mm,
        soil_moisture_pc: env.soil_moisture_pc,
        slope_grade: env.slope_grade,
        num_prev_failures,
    })
}
