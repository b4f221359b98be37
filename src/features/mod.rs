//! Feature pipeline: schema contract, row construction and per-target alignment.

pub mod aligner;
pub mod builder;
pub mod schema;

pub use aligner::{align, AlignedFeatureRow};
pub use builder::{build, EngineeredFeatureRow};
pub use schema::{CategoryVocabulary, FeatureSchema, SchemaFile};
