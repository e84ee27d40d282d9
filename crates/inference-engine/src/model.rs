//! Regression Model Backends

use crate::InferenceError;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Externally trained regressor producing one demand value per record
pub trait Regressor: Send + Sync {
    /// Number of features the model accepts, when the artifact declares it
    fn input_dimension(&self) -> Option<usize>;

    /// Predict demand (MW) for one prepared record
    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Linear model exported as coefficients and intercept
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    /// Create from fitted parameters
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, InferenceError> {
        if coefficients.is_empty() {
            return Err(InferenceError::ModelLoadError(
                "linear model has no coefficients".to_string(),
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(InferenceError::ModelLoadError(
                "linear model parameters must be finite".to_string(),
            ));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Regressor for LinearRegressor {
    fn input_dimension(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != self.coefficients.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        let dot: f64 = features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(x, w)| x * w)
            .sum();
        Ok(dot + self.intercept)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// ONNX regressor (e.g. a converted random forest) executed with tract
pub struct OnnxRegressor {
    plan: OnnxPlan,
    input_dim: usize,
}

impl OnnxRegressor {
    /// Load and optimise an ONNX model taking a `[1, input_dim]` f32 input
    pub fn load(path: &Path, input_dim: usize) -> Result<Self, InferenceError> {
        info!("Loading ONNX model {} (input dim {})", path.display(), input_dim);

        let load_err =
            |e: TractError| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e));

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact([1, input_dim]).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        Ok(Self { plan, input_dim })
    }
}

impl Regressor for OnnxRegressor {
    fn input_dimension(&self) -> Option<usize> {
        Some(self.input_dim)
    }

    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != self.input_dim {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_dim,
                actual: features.len(),
            });
        }

        let failed = |e: TractError| InferenceError::InferenceFailed(e.to_string());

        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_shape(&[1, self.input_dim], &data).map_err(failed)?;
        let outputs = self.plan.run(tvec!(input.into())).map_err(failed)?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no output".to_string()))?;
        let values = output.cast_to::<f64>().map_err(failed)?;
        let prediction = values
            .as_slice::<f64>()
            .map_err(failed)?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("empty model output".to_string()))?;

        debug!("ONNX prediction: {}", prediction);
        Ok(prediction)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}
