//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults::MAX_WEATHER_TIMEOUT_MS;
use super::ServiceConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for ServiceConfig.
///
/// Maintained by hand to match the struct hierarchy in service_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        "server.cors_origins",
        // [models]
        "models",
        "models.artifacts_dir",
        // [weather]
        "weather",
        "weather.enabled",
        "weather.base_url",
        "weather.timeout_ms",
        "weather.fallback_temperature_c",
    ];
    keys.iter().copied().collect()
}

/// Recursively collect dotted key paths from a TOML value.
///
/// Arrays are treated as leaves; their elements are not walked.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let toml::Value::Table(table) = value {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            keys.extend(walk_toml_keys(v, &path));
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed ServiceConfig.
///
/// Every returned string is an error that must prevent startup.
pub fn validate_ranges(config: &ServiceConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.server.addr.trim().is_empty() {
        errors.push("server.addr must not be empty".to_string());
    }

    if config.models.artifacts_dir.as_os_str().is_empty() {
        errors.push("models.artifacts_dir must not be empty".to_string());
    }

    let w = &config.weather;
    if w.timeout_ms == 0 || w.timeout_ms > MAX_WEATHER_TIMEOUT_MS {
        errors.push(format!(
            "weather.timeout_ms = {} is outside the allowed range (1-{} ms)",
            w.timeout_ms, MAX_WEATHER_TIMEOUT_MS
        ));
    }
    if !w.fallback_temperature_c.is_finite() {
        errors.push(format!(
            "weather.fallback_temperature_c = {} must be a finite number",
            w.fallback_temperature_c
        ));
    }
    if w.enabled && !(w.base_url.starts_with("http://") || w.base_url.starts_with("https://")) {
        errors.push(format!(
            "weather.base_url = '{}' must be an http(s) URL",
            w.base_url
        ));
    }

    errors
}

// ============================================================================
// Tests
// ============================================================================
