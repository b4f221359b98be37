//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";

/// Default directory holding one sub-directory per target model.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

// ============================================================================
// Request
// ============================================================================

/// Asset length used when a request omits `length_m`.
pub const DEFAULT_LENGTH_M: f64 = 10.0;

/// Format of `snapshot_date` and of the defaulted "today".
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Weather
// ============================================================================

/// Open-Meteo forecast endpoint.
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Default bound on the weather call (ms).
pub const DEFAULT_WEATHER_TIMEOUT_MS: u64 = 5_000;

/// Hard ceiling for the configurable weather timeout (ms).
pub const MAX_WEATHER_TIMEOUT_MS: u64 = 5_000;

/// Temperature used whenever the weather lookup fails (°C).
pub const FALLBACK_TEMPERATURE_C: f64 = 15.0;

// ============================================================================
// Feature Engineering
// ============================================================================

/// `days_since_repair` when the repair date cannot be parsed.
pub const UNKNOWN_REPAIR_DAYS: f64 = 999.0;

/// Every numeric feature is clipped to `[-FEATURE_CLIP_LIMIT, FEATURE_CLIP_LIMIT]`.
pub const FEATURE_CLIP_LIMIT: f64 = 1e6;

/// Repairs newer than this many days set `recent_repair`.
pub const RECENT_REPAIR_DAYS: f64 = 180.0;

/// Assets older than this many years set `old_asset`.
pub const OLD_ASSET_YEARS: f64 = 40.0;

// ============================================================================
// Failure History Proxy
// ============================================================================

/// Upper bound of `num_prev_failures` (maximum seen in training data).
pub const MAX_PREV_FAILURES: i64 = 18;
