//! Feature Schema Descriptors
//!
//! A model is only meaningful against the exact column order it was fitted
//! with. The descriptor makes that order explicit and versioned so it can be
//! shipped next to the model artifact and checked on load.

use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current layout version for both variants
pub const SCHEMA_VERSION: u32 = 1;

/// Column order of the basic schema
pub const BASIC_FIELDS: [&str; 8] = [
    "Outdoor_Temp",
    "Is_Holiday",
    "Hour",
    "Day",
    "Month",
    "DayOfWeek",
    "Temp_Hour_Interaction",
    "Temp_Squared",
];

/// Column order of the extended schema
pub const EXTENDED_FIELDS: [&str; 13] = [
    "Outdoor_Temp",
    "Is_Holiday",
    "Hour",
    "Day",
    "Month",
    "DayOfWeek",
    "Temp_Hour_Interaction",
    "Temp_Squared",
    "Weekday",
    "Lag_1",
    "Lag_24",
    "Rolling_Mean_3",
    "Rolling_Std_3",
];

pub(crate) const TEMPERATURE_IDX: usize = 0;
pub(crate) const HOUR_IDX: usize = 2;
pub(crate) const INTERACTION_IDX: usize = 6;
pub(crate) const SQUARED_IDX: usize = 7;

/// Schema variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Calendar, temperature and derived terms (8 fields)
    Basic,
    /// Basic fields plus lag and rolling demand statistics (13 fields)
    Extended,
}

impl SchemaVariant {
    /// Ordered field names
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SchemaVariant::Basic => &BASIC_FIELDS,
            SchemaVariant::Extended => &EXTENDED_FIELDS,
        }
    }

    /// Number of fields in a record of this variant
    pub fn len(&self) -> usize {
        self.fields().len()
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::Basic => "basic",
            SchemaVariant::Extended => "extended",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned column layout a model was fitted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub variant: SchemaVariant,
    pub version: u32,
    pub fields: Vec<String>,
}

impl SchemaDescriptor {
    /// Canonical descriptor produced by the pipeline for a variant
    pub fn canonical(variant: SchemaVariant) -> Self {
        Self {
            variant,
            version: SCHEMA_VERSION,
            fields: variant.fields().iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check that this descriptor (usually read from an artifact) describes
    /// exactly the layout the pipeline produces for its variant.
    pub fn verify_canonical(&self) -> Result<(), FeatureError> {
        let expected = Self::canonical(self.variant);

        if self.version != expected.version {
            return Err(FeatureError::SchemaMismatch(format!(
                "{} schema version {} is not supported (expected {})",
                self.variant, self.version, expected.version
            )));
        }

        if self.fields.len() != expected.fields.len() {
            return Err(FeatureError::FieldCountMismatch {
                variant: self.variant,
                expected: expected.fields.len(),
                actual: self.fields.len(),
            });
        }

        if let Some((idx, (got, want))) = self
            .fields
            .iter()
            .zip(expected.fields.iter())
            .enumerate()
            .find(|(_, (got, want))| got != want)
        {
            return Err(FeatureError::SchemaMismatch(format!(
                "field {} is '{}', expected '{}'",
                idx, got, want
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_descriptor_verifies() {
        for variant in [SchemaVariant::Basic, SchemaVariant::Extended] {
            let schema = SchemaDescriptor::canonical(variant);
            assert_eq!(schema.len(), variant.len());
            assert!(schema.verify_canonical().is_ok());
        }
    }

    #[test]
    fn test_extended_starts_with_basic() {
        assert_eq!(&EXTENDED_FIELDS[..BASIC_FIELDS.len()], &BASIC_FIELDS[..]);
        assert_eq!(BASIC_FIELDS[TEMPERATURE_IDX], "Outdoor_Temp");
        assert_eq!(BASIC_FIELDS[HOUR_IDX], "Hour");
        assert_eq!(BASIC_FIELDS[INTERACTION_IDX], "Temp_Hour_Interaction");
        assert_eq!(BASIC_FIELDS[SQUARED_IDX], "Temp_Squared");
    }

    #[test]
    fn test_swapped_fields_rejected() {
        let mut schema = SchemaDescriptor::canonical(SchemaVariant::Basic);
        schema.fields.swap(2, 3);
        let err = schema.verify_canonical().unwrap_err();
        assert!(matches!(err, FeatureError::SchemaMismatch(msg) if msg.contains("field 2")));
    }

    #[test]
    fn test_wrong_count_rejected() {
        let mut schema = SchemaDescriptor::canonical(SchemaVariant::Extended);
        schema.fields.pop();
        assert_eq!(
            schema.verify_canonical(),
            Err(FeatureError::FieldCountMismatch {
                variant: SchemaVariant::Extended,
                expected: 13,
                actual: 12,
            })
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut schema = SchemaDescriptor::canonical(SchemaVariant::Basic);
        schema.version = 2;
        assert!(schema.verify_canonical().is_err());
    }
}
