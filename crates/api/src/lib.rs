//! Energy Demand Prediction API Server
//!
//! HTTP surface around the feature pipeline and the demand model: collects
//! operating conditions as JSON, builds the feature record, runs inference and
//! returns the prediction with its demand band.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use feature_engine::SchemaVariant;
use inference_engine::{BandThresholds, InferenceEngine, InferenceError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use crate::config::AppConfig;
pub use crate::error::{ApiError, LoggingError};

use crate::config::LoggingConfig;
use crate::rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers.
///
/// Built once at start and never mutated; the model is either loaded or the
/// load error is kept so the server can report its degraded state.
pub struct AppState {
    /// Loaded inference engine
    engine: Option<InferenceEngine>,
    /// Why the engine is missing
    load_error: Option<String>,
    /// Input range defaults
    pub validator: Validator,
    /// Demand band thresholds
    pub thresholds: BandThresholds,
    /// Prometheus handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create application state from an engine load outcome
    pub fn new(engine: Result<InferenceEngine, InferenceError>, config: &AppConfig) -> Self {
        let (engine, load_error) = match engine {
            Ok(engine) => (Some(engine), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            engine,
            load_error,
            validator: Validator::new(config.validation.clone()),
            thresholds: config.bands,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Load the model named in the configuration; failures leave the state degraded
    pub fn load(config: &AppConfig) -> Self {
        let engine = InferenceEngine::from_manifest_path(&config.model.manifest_path);
        if let Err(e) = &engine {
            error!(
                "Failed to load model from {}: {} (serving in degraded mode)",
                config.model.manifest_path.display(),
                e
            );
        }
        Self::new(engine, config)
    }

    /// Attach the Prometheus handle
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Loaded engine, or the reason there is none
    pub fn engine(&self) -> Result<&InferenceEngine, ApiError> {
        self.engine.as_ref().ok_or_else(|| {
            ApiError::ModelUnavailable(
                self.load_error
                    .clone()
                    .unwrap_or_else(|| "no model configured".to_string()),
            )
        })
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelStatus,
}

/// Model component status
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub source: Option<String>,
    pub schema: Option<SchemaVariant>,
    pub scaled: bool,
    pub error: Option<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Router {
    let mut predictions = Router::new()
        .route("/api/v1/predict", post(routes::predictions::predict))
        .route("/api/v1/predict/what-if", post(routes::predictions::what_if));

    if let Some(governor) = rate_limit
        .filter(|config| config.enabled)
        .and_then(create_governor_config)
    {
        predictions = predictions.layer(GovernorLayer { config: governor });
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/schema", get(routes::schema::get_schema))
        .route("/metrics", get(metrics_handler))
        .merge(predictions)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let model = match &state.engine {
        Some(engine) => ModelStatus {
            loaded: true,
            source: Some(engine.source().to_string()),
            schema: Some(engine.schema().variant),
            scaled: engine.has_scaler(),
            error: None,
        },
        None => ModelStatus {
            loaded: false,
            source: None,
            schema: None,
            scaled: false,
            error: state.load_error.clone(),
        },
    };

    let status = if model.loaded { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model,
    })
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = config.max_level()?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Run the server until it fails
pub async fn run_server(state: Arc<AppState>, config: &AppConfig) -> std::io::Result<()> {
    let app = create_router(state, Some(&config.rate_limit));

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr.as_str()).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use feature_engine::SchemaDescriptor;
    use inference_engine::{LinearRegressor, StandardScaler};

    /// Basic-schema engine predicting `400 + 10 * temperature`
    pub fn basic_engine() -> InferenceEngine {
        let mut coefficients = vec![0.0; 8];
        coefficients[0] = 10.0;
        InferenceEngine::new(
            SchemaDescriptor::canonical(SchemaVariant::Basic),
            Box::new(LinearRegressor::new(coefficients, 400.0).unwrap()),
            None,
            "test-basic",
        )
        .unwrap()
    }

    /// Extended-schema engine predicting `lag_1 + temperature`, with an identity scaler
    pub fn extended_engine() -> InferenceEngine {
        let mut coefficients = vec![0.0; 13];
        coefficients[0] = 1.0;
        coefficients[9] = 1.0;
        InferenceEngine::new(
            SchemaDescriptor::canonical(SchemaVariant::Extended),
            Box::new(LinearRegressor::new(coefficients, 0.0).unwrap()),
            Some(Box::new(StandardScaler::new(vec![0.0; 13], vec![1.0; 13]).unwrap())),
            "test-extended",
        )
        .unwrap()
    }

    pub fn router(engine: Result<InferenceEngine, InferenceError>) -> Router {
        router_with(engine, &AppConfig::default(), None)
    }

    pub fn router_with(
        engine: Result<InferenceEngine, InferenceError>,
        config: &AppConfig,
        rate_limit: Option<&RateLimitConfig>,
    ) -> Router {
        let state = AppState::new(engine, config);
        create_router(Arc::new(state), rate_limit)
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
