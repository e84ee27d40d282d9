//! Schema Route

use axum::{extract::State, Json};
use feature_engine::SchemaDescriptor;
use serde::Serialize;
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Response for the schema endpoint
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: SchemaDescriptor,
    pub scaled: bool,
}

/// Get the feature layout of the loaded model
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let engine = state.engine()?;
    Ok(Json(SchemaResponse {
        schema: engine.schema().clone(),
        scaled: engine.has_scaler(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use inference_engine::InferenceError;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_schema_lists_fields_in_order() {
        let response = router(Ok(extended_engine()))
            .oneshot(Request::get("/api/v1/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["schema"]["variant"], "extended");
        assert_eq!(body["schema"]["version"], 1);
        assert_eq!(body["schema"]["fields"][0], "Outdoor_Temp");
        assert_eq!(body["schema"]["fields"][12], "Rolling_Std_3");
        assert_eq!(body["scaled"], true);
    }

    #[tokio::test]
    async fn test_schema_unavailable_when_degraded() {
        let load = Err(InferenceError::ModelLoadError("missing".to_string()));
        let response = router(load)
            .oneshot(Request::get("/api/v1/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
