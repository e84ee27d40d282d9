//! Inference Engine Implementation

use crate::manifest::ModelManifest;
use crate::model::Regressor;
use crate::scaler::Scaler;
use crate::InferenceError;
use feature_engine::{FeaturePipeline, FeatureRecord, SchemaDescriptor};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Result of one prediction
#[derive(Debug, Clone, Serialize)]
pub struct InferenceResult {
    /// Predicted demand (MW)
    pub prediction_mw: f64,
    /// Whether the record went through the scaler
    pub scaled: bool,
    /// Inference latency in microseconds
    pub latency_us: u64,
}

/// Baseline and temperature-adjusted predictions from the same model
#[derive(Debug, Clone, Serialize)]
pub struct WhatIfComparison {
    /// Offset applied to the temperature (°C)
    pub temperature_delta: f64,
    pub baseline: InferenceResult,
    pub adjusted: InferenceResult,
    /// Record the adjusted prediction was made from
    pub adjusted_record: FeatureRecord,
}

impl WhatIfComparison {
    /// Adjusted minus baseline demand (MW)
    pub fn difference_mw(&self) -> f64 {
        self.adjusted.prediction_mw - self.baseline.prediction_mw
    }
}

/// Model, optional scaler and the schema they were fitted with.
///
/// Built once at process start and shared read-only afterwards.
pub struct InferenceEngine {
    schema: SchemaDescriptor,
    pipeline: FeaturePipeline,
    model: Box<dyn Regressor>,
    scaler: Option<Box<dyn Scaler>>,
    source: String,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("schema", &self.schema)
            .field("model", &self.model.name())
            .field("scaler", &self.scaler.as_ref().map(|s| s.name()))
            .field("source", &self.source)
            .finish()
    }
}

impl InferenceEngine {
    /// Create an engine, failing fast when the parts disagree on the layout
    pub fn new(
        schema: SchemaDescriptor,
        model: Box<dyn Regressor>,
        scaler: Option<Box<dyn Scaler>>,
        source: &str,
    ) -> Result<Self, InferenceError> {
        schema.verify_canonical()?;
        let dimension = schema.len();

        if let Some(scaler) = &scaler {
            if scaler.dimension() != dimension {
                return Err(InferenceError::InvalidInputShape {
                    expected: dimension,
                    actual: scaler.dimension(),
                });
            }
        }

        if let Some(model_dimension) = model.input_dimension() {
            if model_dimension != dimension {
                return Err(InferenceError::InvalidInputShape {
                    expected: dimension,
                    actual: model_dimension,
                });
            }
        }

        info!(
            "Inference engine ready: source={}, schema={} v{}, model={}, scaler={}",
            source,
            schema.variant,
            schema.version,
            model.name(),
            scaler.as_ref().map(|s| s.name()).unwrap_or("none")
        );

        Ok(Self {
            pipeline: FeaturePipeline::new(schema.variant),
            schema,
            model,
            scaler,
            source: source.to_string(),
        })
    }

    /// Build an engine from a parsed manifest; `base_dir` resolves relative model paths
    pub fn from_manifest(
        manifest: &ModelManifest,
        base_dir: &Path,
        source: &str,
    ) -> Result<Self, InferenceError> {
        manifest.schema.verify_canonical()?;
        let model = manifest.build_model(base_dir)?;
        let scaler = manifest.build_scaler()?;
        Self::new(manifest.schema.clone(), model, scaler, source)
    }

    /// Load an engine from a manifest file
    pub fn from_manifest_path(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading model manifest: {}", path.display());
        let manifest = ModelManifest::from_path(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(&manifest, base_dir, &path.display().to_string())
    }

    /// Schema the model was fitted with
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Pipeline producing records for this model
    pub fn pipeline(&self) -> FeaturePipeline {
        self.pipeline
    }

    /// Whether a scaler is configured
    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Where the engine was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Verify a record against the model schema and apply the scaler, if any
    pub fn prepare(&self, record: &FeatureRecord) -> Result<Vec<f64>, InferenceError> {
        self.pipeline.check(record)?;
        match &self.scaler {
            Some(scaler) => scaler.transform(record.values()),
            None => Ok(record.values().to_vec()),
        }
    }

    /// Run inference on a feature record
    pub fn predict(&self, record: &FeatureRecord) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        let input = self.prepare(record)?;
        let prediction_mw = self.model.predict(&input)?;
        if !prediction_mw.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "model returned non-finite value {}",
                prediction_mw
            )));
        }

        let latency_us = start.elapsed().as_micros() as u64;
        debug!("Inference completed in {}us: {:.2} MW", latency_us, prediction_mw);

        Ok(InferenceResult {
            prediction_mw,
            scaled: self.scaler.is_some(),
            latency_us,
        })
    }

    /// Predict for a record and for a copy with the temperature offset by `delta`
    pub fn what_if(
        &self,
        record: &FeatureRecord,
        delta: f64,
    ) -> Result<WhatIfComparison, InferenceError> {
        let adjusted_record = self.pipeline.perturb(record, delta)?;
        let baseline = self.predict(record)?;
        let adjusted = self.predict(&adjusted_record)?;

        Ok(WhatIfComparison {
            temperature_delta: delta,
            baseline,
            adjusted,
            adjusted_record,
        })
    }
}
