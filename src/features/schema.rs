//! Feature Schema Registry
//!
//! A [`FeatureSchema`] is the column contract of one trained model: the exact
//! ordered column names it was fitted on plus the category vocabulary used to
//! one-hot encode its categorical fields. Schemas are written once at training
//! time and loaded read-only at startup.
//!
//! ## Rules
//! 1. Column order is part of the contract. Reordering is a new schema.
//! 2. The fingerprint covers every column name in order; a model records the
//!    fingerprint of the schema it was trained against.
//! 3. Indicator columns (`<field>_<category>`) must be backed by the
//!    vocabulary, otherwise they could never be set at inference time.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::error::ArtifactError;

/// On-disk schema format understood by this build.
pub const SCHEMA_FORMAT_VERSION: u32 = 1;

/// Categorical request fields expanded into indicator columns, in the order
/// the builder encodes them.
pub const CATEGORICAL_FIELDS: [&str; 5] = ["type", "material", "soil_type", "region", "traffic"];

/// CRC-32 over the ordered column names, each followed by a NUL separator.
pub fn layout_fingerprint<S: AsRef<str>>(columns: &[S]) -> u32 {
    let mut hasher = Hasher::new();
    for name in columns {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Name of the indicator column for `category` of `field`.
pub fn indicator_column(field: &str, category: &str) -> String {
    format!("{field}_{category}")
}

/// Training-time categories per categorical field.
///
/// Categories are kept sorted; the first one is the drop-first reference and
/// has no indicator column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryVocabulary(BTreeMap<String, BTreeSet<String>>);

impl CategoryVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `categories` under `field`.
    pub fn insert<I, S>(&mut self, field: &str, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(field.to_string())
            .or_default()
            .extend(categories.into_iter().map(Into::into));
    }

    /// Union of both vocabularies, per field.
    pub fn merge(&mut self, other: &CategoryVocabulary) {
        for (field, cats) in &other.0 {
            self.0.entry(field.clone()).or_default().extend(cats.iter().cloned());
        }
    }

    /// Sorted categories of `field`, empty when the field was never seen.
    pub fn categories(&self, field: &str) -> impl Iterator<Item = &str> {
        self.0.get(field).into_iter().flatten().map(String::as_str)
    }

    /// The drop-first reference category of `field`.
    pub fn reference(&self, field: &str) -> Option<&str> {
        self.categories(field).next()
    }

    /// Categories that get an indicator column (all but the reference).
    pub fn encoded_categories(&self, field: &str) -> impl Iterator<Item = &str> {
        self.categories(field).skip(1)
    }

    pub fn contains(&self, field: &str, category: &str) -> bool {
        self.0.get(field).is_some_and(|c| c.contains(category))
    }
}

/// Serialized form of `schema.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub format_version: u32,
    pub target: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub categories: CategoryVocabulary,
    /// Stored fingerprint; verified against the columns when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<u32>,
}

/// Validated column contract for one target model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    target: String,
    columns: Vec<String>,
    categories: CategoryVocabulary,
    fingerprint: u32,
}

impl FeatureSchema {
    /// Build and validate a schema.
    pub fn new(
        target: impl Into<String>,
        columns: Vec<String>,
        categories: CategoryVocabulary,
    ) -> Result<Self, ArtifactError> {
        let target = target.into();
        let invalid = |reason: String| ArtifactError::InvalidSchema {
            target: target.clone(),
            reason,
        };

        if columns.is_empty() {
            return Err(invalid("schema has no columns".to_string()));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if col.trim().is_empty() {
                return Err(invalid("empty column name".to_string()));
            }
            if !seen.insert(col.as_str()) {
                return Err(invalid(format!("duplicate column '{col}'")));
            }
        }

        for col in &columns {
            if let Some(field) = indicator_field(col) {
                let category = &col[field.len() + 1..];
                if !categories.contains(field, category) {
                    return Err(invalid(format!(
                        "indicator column '{col}' has no '{field}' vocabulary entry"
                    )));
                }
                if categories.reference(field) == Some(category) {
                    return Err(invalid(format!(
                        "indicator column '{col}' encodes the reference category of '{field}'"
                    )));
                }
            }
        }

        let fingerprint = layout_fingerprint(&columns);
        Ok(Self {
            target,
            columns,
            categories,
            fingerprint,
        })
    }

    /// Validate a deserialized schema file.
    pub fn from_file(file: SchemaFile) -> Result<Self, ArtifactError> {
        if file.format_version != SCHEMA_FORMAT_VERSION {
            return Err(ArtifactError::InvalidSchema {
                target: file.target,
                reason: format!(
                    "unsupported format_version {} (expected {SCHEMA_FORMAT_VERSION})",
                    file.format_version
                ),
            });
        }
        let stored = file.fingerprint;
        let schema = Self::new(file.target, file.columns, file.categories)?;
        if let Some(stored) = stored {
            if stored != schema.fingerprint {
                return Err(ArtifactError::InvalidSchema {
                    target: schema.target,
                    reason: format!(
                        "stored fingerprint {stored:08x} does not match columns ({:08x})",
                        schema.fingerprint
                    ),
                });
            }
        }
        Ok(schema)
    }

    /// Load `schema.json` from disk.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ArtifactError::Io(path.to_path_buf(), e))?;
        let file: SchemaFile =
            serde_json::from_str(&raw).map_err(|e| ArtifactError::Json(path.to_path_buf(), e))?;
        Self::from_file(file)
    }

    pub fn to_file(&self) -> SchemaFile {
        SchemaFile {
            format_version: SCHEMA_FORMAT_VERSION,
            target: self.target.clone(),
            columns: self.columns.clone(),
            categories: self.categories.clone(),
            fingerprint: Some(self.fingerprint),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn categories(&self) -> &CategoryVocabulary {
        &self.categories
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Categorical field a column name encodes, if it is an indicator column.
fn indicator_field(column: &str) -> Option<&'static str> {
    CATEGORICAL_FIELDS.iter().copied().find(|field| {
        column.len() > field.len() + 1
            && column.starts_with(field)
            && column.as_bytes()[field.len()] == b'_'
    })
}
