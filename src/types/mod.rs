//! Shared data structures for the asset-risk pipeline
//!
//! - `AssetRecord`: raw request attributes
//! - `ResolvedContext`: location, weather and history resolved per request
//! - `PredictionResult`: combined decision returned to the caller

mod asset;
mod prediction;

pub use asset::*;
pub use prediction::*;
