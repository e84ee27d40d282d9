//! Feature Engineering Engine
//!
//! Turns raw operating conditions into the ordered feature record a demand
//! model was fitted with, including the derived interaction and polynomial
//! terms and the optional lag/rolling trend statistics.

mod features;
mod schema;
mod statistics;

pub use features::{
    CalendarInputs, FeaturePipeline, FeatureRecord, TrendInputs, WHAT_IF_TEMPERATURE_DELTA,
};
pub use schema::{SchemaDescriptor, SchemaVariant, BASIC_FIELDS, EXTENDED_FIELDS, SCHEMA_VERSION};

use thiserror::Error;

/// Errors during feature assembly
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Extended schema requires trend statistics (lag and rolling features)")]
    MissingTrend,
    #[error("Demand history too short: need at least {needed} hourly values, got {actual}")]
    InsufficientHistory { needed: usize, actual: usize },
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Record has {actual} fields, schema {variant} expects {expected}")]
    FieldCountMismatch {
        variant: SchemaVariant,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
