//! Range Checking for Raw Inputs

use crate::error::ValidationError;
use feature_engine::{CalendarInputs, TrendInputs};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Hour of day valid range
    pub hour_range: (f64, f64),
    /// Day of month valid range
    pub day_range: (f64, f64),
    /// Month valid range
    pub month_range: (f64, f64),
    /// Day of week valid range (Monday = 0)
    pub weekday_range: (f64, f64),
    /// Optional display clamp for temperature (°C); unbounded when `None`
    pub temperature_range: Option<(f64, f64)>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            hour_range: (0.0, 23.0),
            day_range: (1.0, 31.0),
            month_range: (1.0, 12.0),
            weekday_range: (0.0, 6.0),
            temperature_range: None,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Build a result from collected errors
    pub fn from_errors(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            fields_checked,
        }
    }

    /// Merge another result into this one
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.fields_checked += other.fields_checked;
        self
    }

    /// Convert into a `Result`, keeping every error
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Data validator for raw prediction inputs
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Narrow a raw calendar value to `u8`, reporting values that do not fit as out of `range`
    pub fn narrow_calendar_value(
        &self,
        field: &'static str,
        value: i64,
        range: (f64, f64),
    ) -> Result<u8, ValidationError> {
        u8::try_from(value).map_err(|_| ValidationError::OutOfRange {
            field,
            value: value as f64,
            min: range.0,
            max: range.1,
        })
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is a real number
    pub fn validate_finite(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NotFinite { field })
        }
    }

    /// Validate temperature
    pub fn validate_temperature(&self, temperature: f64) -> Result<(), ValidationError> {
        self.validate_finite("temperature", temperature)?;
        match self.config.temperature_range {
            Some(range) => self.validate_range("temperature", temperature, range),
            None => Ok(()),
        }
    }

    /// Validate hour of day
    pub fn validate_hour(&self, hour: u8) -> Result<(), ValidationError> {
        self.validate_range("hour", f64::from(hour), self.config.hour_range)
    }

    /// Validate day of month
    pub fn validate_day(&self, day: u8) -> Result<(), ValidationError> {
        self.validate_range("day", f64::from(day), self.config.day_range)
    }

    /// Validate month
    pub fn validate_month(&self, month: u8) -> Result<(), ValidationError> {
        self.validate_range("month", f64::from(month), self.config.month_range)
    }

    /// Validate day of week
    pub fn validate_weekday(&self, weekday: u8) -> Result<(), ValidationError> {
        self.validate_range("weekday", f64::from(weekday), self.config.weekday_range)
    }

    /// Validate every calendar field, collecting all errors
    pub fn validate_calendar(&self, inputs: &CalendarInputs) -> ValidationResult {
        let checks = [
            self.validate_temperature(inputs.temperature),
            self.validate_hour(inputs.hour),
            self.validate_day(inputs.day),
            self.validate_month(inputs.month),
            self.validate_weekday(inputs.weekday),
        ];
        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if !errors.is_empty() {
            debug!("Calendar inputs rejected: {} error(s)", errors.len());
        }
        ValidationResult::from_errors(errors, fields_checked)
    }

    /// Validate trend statistics (finite values only)
    pub fn validate_trend(&self, trend: &TrendInputs) -> ValidationResult {
        let checks = [
            self.validate_finite("lag_1", trend.lag_1),
            self.validate_finite("lag_24", trend.lag_24),
            self.validate_finite("rolling_mean_3", trend.rolling_mean_3),
            self.validate_finite("rolling_std_3", trend.rolling_std_3),
        ];
        let fields_checked = checks.len();
        let errors = checks.into_iter().filter_map(Result::err).collect();
        ValidationResult::from_errors(errors, fields_checked)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
