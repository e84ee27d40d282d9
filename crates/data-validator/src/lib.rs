//! Input Validation
//!
//! Range defaults for the raw operating conditions accepted by the serving
//! surface. The feature pipeline itself does not enforce these ranges.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
