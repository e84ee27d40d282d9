//! Fitted Affine Scalers

use crate::InferenceError;

/// Pre-fitted feature transform applied before inference
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted on
    fn dimension(&self) -> usize;

    /// Transform one record
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, InferenceError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

fn check_dimension(expected: usize, values: &[f64]) -> Result<(), InferenceError> {
    if values.len() != expected {
        return Err(InferenceError::InvalidInputShape {
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn check_params(kind: &str, a: &[f64], b: &[f64]) -> Result<(), InferenceError> {
    if a.len() != b.len() {
        return Err(InferenceError::ModelLoadError(format!(
            "{} scaler parameter lengths differ ({} vs {})",
            kind,
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(InferenceError::ModelLoadError(format!(
            "{} scaler parameters must be finite",
            kind
        )));
    }
    Ok(())
}

/// Standardisation: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Create from fitted parameters
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, InferenceError> {
        check_params("standard", &mean, &scale)?;
        if scale.iter().any(|s| *s == 0.0) {
            return Err(InferenceError::ModelLoadError(
                "standard scaler has a zero scale".to_string(),
            ));
        }
        Ok(Self { mean, scale })
    }
}

impl Scaler for StandardScaler {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_dimension(self.dimension(), values)?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Min-max scaling in the fitted form `x * scale + min`
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    scale: Vec<f64>,
}

impl MinMaxScaler {
    /// Create from fitted parameters
    pub fn new(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, InferenceError> {
        check_params("min_max", &min, &scale)?;
        Ok(Self { min, scale })
    }
}

impl Scaler for MinMaxScaler {
    fn dimension(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_dimension(self.dimension(), values)?;
        Ok(values
            .iter()
            .zip(self.min.iter().zip(self.scale.iter()))
            .map(|(x, (min, scale))| x * scale + min)
            .collect())
    }

    fn name(&self) -> &'static str {
        "min_max"
    }
}
