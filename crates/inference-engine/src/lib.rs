//! Demand Inference Engine
//!
//! Loads a regression model artifact together with its schema descriptor and
//! optional scaler, verifies that feature records match the layout the model
//! was fitted with, and runs predictions. ONNX artifacts run on tract-onnx.

mod band;
mod engine;
mod insight;
mod manifest;
mod model;
mod scaler;

pub use band::{format_mw, BandThresholds, DemandBand};
pub use engine::{InferenceEngine, InferenceResult, WhatIfComparison};
pub use insight::explain;
pub use manifest::{ModelManifest, ModelSpec, ScalerSpec};
pub use model::{LinearRegressor, OnnxRegressor, Regressor};
pub use scaler::{MinMaxScaler, Scaler, StandardScaler};

use feature_engine::FeatureError;
use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error(transparent)]
    Schema(#[from] FeatureError),
}
