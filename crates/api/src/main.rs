//! Energy Demand Predictor - Main Entry Point
//!
//! Usage: `demand-predictor [CONFIG_FILE]` (or set `DEMAND_CONFIG`).

use api::{init_logging, run_server, AppConfig, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DEMAND_CONFIG").ok());

    let config = AppConfig::load(config_path.as_deref())?;
    config.validate()?;
    init_logging(&config.logging)?;

    info!("=== Energy Demand Predictor v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = if config.metrics.enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    // Model and scaler are loaded once here and shared read-only
    let state = AppState::load(&config).with_metrics(metrics);
    run_server(Arc::new(state), &config).await?;

    Ok(())
}
