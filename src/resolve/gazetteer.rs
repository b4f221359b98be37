//! Fixed Bay Area gazetteer: region coordinates, bounding boxes, traffic
//! tiers and the environmental profile used at serving time.
//!
//! Region names are matched after trimming whitespace and are
//! case-sensitive, matching the category values in the training data.

use crate::types::TrafficLevel;

/// Coordinate used for region names missing from [`REGION_COORDINATES`].
pub const FALLBACK_COORDINATES: (f64, f64) = (37.338207, -121.886330);

/// Representative coordinate per region.
pub const REGION_COORDINATES: &[(&str, (f64, f64))] = &[
    ("Contra Costa", (37.9199, -121.9358)),
    ("Alameda", (37.756944, -122.274444)),
    ("Sonoma", (38.445595, -122.595747)),
    ("Santa Clara", (37.35411, -121.95524)),
    ("Napa", (38.297804, -122.28636)),
    ("San Francisco", (37.715, -122.4285)),
    ("Marin", (37.868538, -122.5091404)),
    ("San Mateo", (37.563, -122.324)),
    ("Solano", (38.316, -122.018)),
];

/// Axis-aligned region bounds, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub region: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }
}

/// Reverse-lookup boxes, evaluated in order; first match wins.
pub const REGION_BOUNDS: &[BoundingBox] = &[
    BoundingBox { region: "Santa Clara", lat_min: 36.89238291632208, lat_max: 37.48534080282651, lon_min: -122.20259387759805, lon_max: -121.21382434174066 },
    BoundingBox { region: "Alameda", lat_min: 37.45422122137626, lat_max: 37.90527, lon_min: -122.34177172635131, lon_max: -121.46973192736596 },
    BoundingBox { region: "Sonoma", lat_min: 38.11230588756946, lat_max: 38.85190504809042, lon_min: -123.5324716054025, lon_max: -122.34869474441764 },
    BoundingBox { region: "Contra Costa", lat_min: 37.71888575931279, lat_max: 38.10135722489106, lon_min: -122.4300892162658, lon_max: -121.53333017888399 },
    BoundingBox { region: "Napa", lat_min: 38.153660062350056, lat_max: 38.86397170801056, lon_min: -122.64656355512427, lon_max: -122.06154157974197 },
    BoundingBox { region: "San Francisco", lat_min: 37.70841124861289, lat_max: 37.81141713562808, lon_min: -122.51793825593296, lon_max: -122.3278475588094 },
    BoundingBox { region: "Marin", lat_min: 37.8152822778324, lat_max: 38.32117636904628, lon_min: -123.03056485363471, lon_max: -122.41258389372383 },
    BoundingBox { region: "San Mateo", lat_min: 37.10780636280471, lat_max: 37.70994030426103, lon_min: -122.52143637988625, lon_max: -122.20259387759806 },
    BoundingBox { region: "Solano", lat_min: 38.0398174918701, lat_max: 38.54067561081478, lon_min: -122.40928351247523, lon_max: -121.59217535437085 },
];

/// Traffic tier per region. Regions not listed are `Low`.
pub const REGION_TRAFFIC: &[(&str, TrafficLevel)] = &[
    ("San Francisco", TrafficLevel::High),
    ("Santa Clara", TrafficLevel::High),
    ("Alameda", TrafficLevel::Medium),
    ("Contra Costa", TrafficLevel::Medium),
    ("San Mateo", TrafficLevel::Medium),
    ("Marin", TrafficLevel::Low),
    ("Napa", TrafficLevel::Low),
    ("Sonoma", TrafficLevel::Low),
    ("Solano", TrafficLevel::Low),
];

const WET_REGIONS: &[&str] = &["San Francisco", "Marin", "Sonoma"];
const STEEP_REGIONS: &[&str] = &["San Francisco", "Marin"];

/// Representative coordinates for a region name, or [`FALLBACK_COORDINATES`].
pub fn coordinates_for_region(name: &str) -> (f64, f64) {
    let name = name.trim();
    REGION_COORDINATES
        .iter()
        .find(|(region, _)| *region == name)
        .map_or(FALLBACK_COORDINATES, |(_, coords)| *coords)
}

/// Region whose bounding box contains the coordinate, if any.
pub fn region_for_coordinates(lat: f64, lon: f64) -> Option<&'static str> {
    REGION_BOUNDS
        .iter()
        .find(|b| b.contains(lat, lon))
        .map(|b| b.region)
}

/// Traffic tier for a region; unknown or missing regions are `Low`.
pub fn traffic_level_for_region(name: Option<&str>) -> TrafficLevel {
    let Some(name) = name.map(str::trim) else {
        return TrafficLevel::Low;
    };
    REGION_TRAFFIC
        .iter()
        .find(|(region, _)| *region == name)
        .map_or(TrafficLevel::Low, |(_, level)| *level)
}

/// Site conditions the training data recorded but requests cannot supply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentProfile {
    pub rainfall_mm: f64,
    pub soil_moisture_pc: f64,
    pub slope_grade: f64,
}

/// Estimate site conditions from region and soil.
pub fn environment_profile(region: Option<&str>, soil_type: &str) -> EnvironmentProfile {
    let region = region.map(str::trim);
    let in_set = |set: &[&str]| region.is_some_and(|r| set.contains(&r));

    EnvironmentProfile {
        rainfall_mm: if in_set(WET_REGIONS) { 30.0 } else { 20.0 },
        soil_moisture_pc: if soil_type.trim().eq_ignore_ascii_case("clay") {
            45.0
        } else {
            30.0
        },
        slope_grade: if in_set(STEEP_REGIONS) { 4.0 } else { 2.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_region_coordinates() {
        assert_eq!(coordinates_for_region("Santa Clara"), (37.35411, -121.95524));
        assert_eq!(coordinates_for_region("  Napa "), (38.297804, -122.28636));
    }

    #[test]
    fn test_unknown_region_uses_fallback() {
        assert_eq!(coordinates_for_region("Atlantis"), FALLBACK_COORDINATES);
        assert_eq!(coordinates_for_region("santa clara"), FALLBACK_COORDINATES);
    }

    #[test]
    fn test_every_region_centroid_reverse_resolves() {
        assert_eq!(region_for_coordinates(37.35411, -121.95524), Some("Santa Clara"));
        assert_eq!(region_for_coordinates(37.715, -122.4285), Some("San Francisco"));
        assert_eq!(region_for_coordinates(38.445595, -122.595747), Some("Sonoma"));
        // San Mateo's centroid also lies in the earlier Alameda box.
        assert_eq!(region_for_coordinates(37.563, -122.324), Some("Alameda"));
        assert_eq!(region_for_coordinates(37.4, -122.4), Some("San Mateo"));
    }

    #[test]
    fn test_first_matching_box_wins() {
        // Inside both the Santa Clara and Alameda boxes.
        let (lat, lon) = (37.47, -121.9);
        assert!(REGION_BOUNDS[1].contains(lat, lon));
        assert_eq!(region_for_coordinates(lat, lon), Some("Santa Clara"));
    }

    #[test]
    fn test_coordinates_outside_every_box() {
        assert_eq!(region_for_coordinates(40.7128, -74.0060), None);
        assert_eq!(region_for_coordinates(f64::NAN, -122.0), None);
    }

    #[test]
    fn test_traffic_levels() {
        assert_eq!(traffic_level_for_region(Some("Santa Clara")), TrafficLevel::High);
        assert_eq!(traffic_level_for_region(Some("Alameda ")), TrafficLevel::Medium);
        assert_eq!(traffic_level_for_region(Some("Napa")), TrafficLevel::Low);
        assert_eq!(traffic_level_for_region(Some("Gotham")), TrafficLevel::Low);
        assert_eq!(traffic_level_for_region(None), TrafficLevel::Low);
    }

    #[test]
    fn test_environment_profile() {
        let sf = environment_profile(Some("San Francisco"), "Clay");
        assert_eq!(sf, EnvironmentProfile { rainfall_mm: 30.0, soil_moisture_pc: 45.0, slope_grade: 4.0 });

        let sonoma = environment_profile(Some("Sonoma"), "loam");
        assert_eq!(sonoma, EnvironmentProfile { rainfall_mm: 30.0, soil_moisture_pc: 30.0, slope_grade: 2.0 });

        let unknown = environment_profile(None, "sandy");
        assert_eq!(unknown, EnvironmentProfile { rainfall_mm: 20.0, soil_moisture_pc: 30.0, slope_grade: 2.0 });
    }
}
