//! Feature Aligner: reindex an engineered row to one schema's columns.

use crate::features::builder::EngineeredFeatureRow;
use crate::features::schema::FeatureSchema;

/// Model input vector in exact schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatureRow {
    values: Vec<f64>,
    fingerprint: u32,
    filled: usize,
}

impl AlignedFeatureRow {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fingerprint of the schema this row was aligned to.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Number of schema columns absent from the row and filled with 0.
    pub fn filled(&self) -> usize {
        self.filled
    }
}

/// Take each schema column from `row`, 0 when absent. Extra row columns are
/// dropped. The result always has `schema.len()` values.
pub fn align(row: &EngineeredFeatureRow, schema: &FeatureSchema) -> AlignedFeatureRow {
    let mut filled = 0;
    let values = schema
        .columns()
        .iter()
        .map(|col| {
            row.get(col).unwrap_or_else(|| {
                filled += 1;
                0.0
            })
        })
        .collect();

    AlignedFeatureRow {
        values,
        fingerprint: schema.fingerprint(),
        filled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::schema::CategoryVocabulary;

    fn schema(cols: &[&str]) -> FeatureSchema {
        let mut vocab = CategoryVocabulary::new();
        vocab.insert("traffic", ["high", "low", "medium"]);
        FeatureSchema::new("risk_score", cols.iter().map(|s| s.to_string()).collect(), vocab).unwrap()
    }

    fn row() -> EngineeredFeatureRow {
        [("length_m", 150.0), ("slope_grade", 2.0), ("traffic_low", 1.0), ("extra", 9.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_align_follows_schema_order() {
        let s = schema(&["slope_grade", "traffic_low", "length_m"]);
        let aligned = align(&row(), &s);
        assert_eq!(aligned.values(), &[2.0, 1.0, 150.0]);
        assert_eq!(aligned.filled(), 0);
        assert_eq!(aligned.fingerprint(), s.fingerprint());
    }

    #[test]
    fn test_missing_columns_filled_with_zero_and_extras_dropped() {
        let s = schema(&["length_m", "traffic_medium", "rain_stress"]);
        let aligned = align(&row(), &s);
        assert_eq!(aligned.values(), &[150.0, 0.0, 0.0]);
        assert_eq!(aligned.filled(), 2);
        assert_eq!(aligned.len(), s.len());
    }

    #[test]
    fn test_empty_row_still_matches_schema_length() {
        let s = schema(&["a", "b", "c", "d"]);
        let aligned = align(&EngineeredFeatureRow::default(), &s);
        assert_eq!(aligned.len(), 4);
        assert!(aligned.values().iter().all(|v| *v == 0.0));
    }
}
