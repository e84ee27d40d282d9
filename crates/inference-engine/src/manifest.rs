//! Model Artifact Manifest
//!
//! A manifest bundles the schema descriptor a model was fitted with, the model
//! itself (inline linear parameters or a path to an ONNX file) and the
//! optional scaler. Example:
//!
//! ```json
//! {
//!   "schema": { "variant": "basic", "version": 1, "fields": ["Outdoor_Temp", "..."] },
//!   "model": { "kind": "onnx", "path": "energy_model.onnx" },
//!   "scaler": { "kind": "standard", "mean": [..], "scale": [..] }
//! }
//! ```

use crate::model::{LinearRegressor, OnnxRegressor, Regressor};
use crate::scaler::{MinMaxScaler, Scaler, StandardScaler};
use crate::InferenceError;
use feature_engine::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model section of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Inline linear regression parameters
    Linear { coefficients: Vec<f64>, intercept: f64 },
    /// ONNX file, relative paths resolve against the manifest directory
    Onnx { path: PathBuf },
}

/// Scaler section of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

/// Model artifact manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub schema: SchemaDescriptor,
    pub model: ModelSpec,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
}

impl ModelManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        serde_json::from_str(json)
            .map_err(|e| InferenceError::ModelLoadError(format!("invalid manifest: {}", e)))
    }

    /// Read and parse a manifest file
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Read manifest {} ({} bytes)", path.display(), json.len());
        Self::from_json(&json)
    }

    /// Instantiate the regressor
    pub(crate) fn build_model(&self, base_dir: &Path) -> Result<Box<dyn Regressor>, InferenceError> {
        match &self.model {
            ModelSpec::Linear {
                coefficients,
                intercept,
            } => Ok(Box::new(LinearRegressor::new(
                coefficients.clone(),
                *intercept,
            )?)),
            ModelSpec::Onnx { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                };
                Ok(Box::new(OnnxRegressor::load(&path, self.schema.len())?))
            }
        }
    }

    /// Instantiate the scaler, if one is configured
    pub(crate) fn build_scaler(&self) -> Result<Option<Box<dyn Scaler>>, InferenceError> {
        let scaler: Option<Box<dyn Scaler>> = match &self.scaler {
            None => None,
            Some(ScalerSpec::Standard { mean, scale }) => {
                Some(Box::new(StandardScaler::new(mean.clone(), scale.clone())?))
            }
            Some(ScalerSpec::MinMax { min, scale }) => {
                Some(Box::new(MinMaxScaler::new(min.clone(), scale.clone())?))
            }
        };
        Ok(scaler)
    }
}
