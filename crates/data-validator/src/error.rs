//! Validation Error Types

use serde::Serialize;
use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}
