//! Feature Record Assembly

use crate::schema::{
    SchemaDescriptor, SchemaVariant, HOUR_IDX, INTERACTION_IDX, SQUARED_IDX, TEMPERATURE_IDX,
};
use crate::FeatureError;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Temperature offset used for the "+10°C" what-if comparison
pub const WHAT_IF_TEMPERATURE_DELTA: f64 = 10.0;

/// Day-first layouts used by the historical dataset, tried after RFC 3339
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Raw operating conditions entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarInputs {
    /// Outdoor temperature (°C), any real
    pub temperature: f64,
    /// Public holiday flag
    pub holiday: bool,
    /// Hour of day (0-23)
    pub hour: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Month (1-12)
    pub month: u8,
    /// Day of week, Monday = 0 (0-6)
    pub weekday: u8,
}

impl CalendarInputs {
    /// Derive the calendar fields from a wall-clock timestamp
    pub fn from_datetime(timestamp: NaiveDateTime, temperature: f64, holiday: bool) -> Self {
        Self {
            temperature,
            holiday,
            hour: timestamp.hour() as u8,
            day: timestamp.day() as u8,
            month: timestamp.month() as u8,
            weekday: timestamp.weekday().num_days_from_monday() as u8,
        }
    }

    /// Parse an RFC 3339 or day-first timestamp, keeping its local wall-clock time
    pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, FeatureError> {
        let raw = raw.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.naive_local());
        }

        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| FeatureError::InvalidTimestamp(raw.to_string()))
    }
}

/// Lag and rolling demand statistics (MW) for the extended schema.
///
/// These are supplied by the caller; the pipeline never derives them from
/// its own state. See [`TrendInputs::from_history`] for a helper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendInputs {
    /// Demand one hour before
    pub lag_1: f64,
    /// Demand at the same hour one day before
    pub lag_24: f64,
    /// Mean of the last three hourly demands
    pub rolling_mean_3: f64,
    /// Standard deviation of the last three hourly demands
    pub rolling_std_3: f64,
}

/// Ordered feature record for one inference request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    variant: SchemaVariant,
    values: Vec<f64>,
}

impl FeatureRecord {
    /// Schema variant the record was built for
    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Values in schema order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a field by its schema name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.variant
            .fields()
            .iter()
            .position(|field| *field == name)
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// Iterate `(field name, value)` pairs in schema order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.variant
            .fields()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Outdoor temperature field
    pub fn temperature(&self) -> f64 {
        self.values[TEMPERATURE_IDX]
    }

    /// Hour field
    pub fn hour(&self) -> f64 {
        self.values[HOUR_IDX]
    }
}

/// Builds feature records for one schema variant.
///
/// The variant is fixed at deployment time by the model artifact the
/// pipeline is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturePipeline {
    variant: SchemaVariant,
}

impl FeaturePipeline {
    /// Create a pipeline for the given variant
    pub fn new(variant: SchemaVariant) -> Self {
        Self { variant }
    }

    /// Variant this pipeline produces
    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Descriptor of the records this pipeline produces
    pub fn schema(&self) -> SchemaDescriptor {
        SchemaDescriptor::canonical(self.variant)
    }

    /// Assemble a feature record from raw inputs
    pub fn build(
        &self,
        calendar: &CalendarInputs,
        trend: Option<&TrendInputs>,
    ) -> Result<FeatureRecord, FeatureError> {
        let temperature = calendar.temperature;
        let hour = f64::from(calendar.hour);
        let weekday = f64::from(calendar.weekday);

        let mut values = Vec::with_capacity(self.variant.len());
        values.push(temperature);
        values.push(if calendar.holiday { 1.0 } else { 0.0 });
        values.push(hour);
        values.push(f64::from(calendar.day));
        values.push(f64::from(calendar.month));
        values.push(weekday);
        values.push(interaction(temperature, hour));
        values.push(squared(temperature));

        match self.variant {
            SchemaVariant::Basic => {
                if trend.is_some() {
                    debug!("Basic schema ignores supplied trend statistics");
                }
            }
            SchemaVariant::Extended => {
                let trend = trend.ok_or(FeatureError::MissingTrend)?;
                values.push(weekday);
                values.push(trend.lag_1);
                values.push(trend.lag_24);
                values.push(trend.rolling_mean_3);
                values.push(trend.rolling_std_3);
            }
        }

        debug!(
            "Built {} feature record: temp={}, hour={}, fields={}",
            self.variant,
            temperature,
            calendar.hour,
            values.len()
        );

        Ok(FeatureRecord {
            variant: self.variant,
            values,
        })
    }

    /// Clone a record with the temperature offset by `delta` and the
    /// temperature-derived terms recomputed. Every other field is unchanged.
    pub fn perturb(&self, record: &FeatureRecord, delta: f64) -> Result<FeatureRecord, FeatureError> {
        self.check(record)?;

        let mut values = record.values.clone();
        let temperature = values[TEMPERATURE_IDX] + delta;
        let hour = values[HOUR_IDX];
        values[TEMPERATURE_IDX] = temperature;
        values[INTERACTION_IDX] = interaction(temperature, hour);
        values[SQUARED_IDX] = squared(temperature);

        Ok(FeatureRecord {
            variant: record.variant,
            values,
        })
    }

    /// Verify that a record was produced for this pipeline's layout
    pub fn check(&self, record: &FeatureRecord) -> Result<(), FeatureError> {
        if record.variant != self.variant {
            return Err(FeatureError::SchemaMismatch(format!(
                "record is {}, pipeline produces {}",
                record.variant, self.variant
            )));
        }
        if record.values.len() != self.variant.len() {
            return Err(FeatureError::FieldCountMismatch {
                variant: self.variant,
                expected: self.variant.len(),
                actual: record.values.len(),
            });
        }
        Ok(())
    }
}

fn interaction(temperature: f64, hour: f64) -> f64 {
    temperature * hour
}

fn squared(temperature: f64) -> f64 {
    temperature * temperature
}
