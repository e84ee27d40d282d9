//! Prediction Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use data_validator::{ValidationError, Validator};
use feature_engine::{
    CalendarInputs, FeatureRecord, SchemaVariant, TrendInputs, WHAT_IF_TEMPERATURE_DELTA,
};
use inference_engine::{explain, format_mw, BandThresholds, DemandBand, InferenceEngine};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};

/// Trend statistics, given directly or computed from recent hourly demand
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrendSource {
    Explicit(TrendInputs),
    History { recent_demand: Vec<f64> },
}

/// Holiday as sent: a boolean or a 0/1 flag
#[derive(Deserialize)]
#[serde(untagged)]
enum HolidayFlag {
    Bool(bool),
    Flag(u64),
}

fn holiday_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match HolidayFlag::deserialize(deserializer)? {
        HolidayFlag::Bool(holiday) => Ok(holiday),
        HolidayFlag::Flag(0) => Ok(false),
        HolidayFlag::Flag(1) => Ok(true),
        HolidayFlag::Flag(other) => Err(de::Error::custom(format!(
            "holiday must be true, false, 0 or 1, got {}",
            other
        ))),
    }
}

/// Request body for the prediction endpoints.
///
/// The moment is given either as `hour`, `day`, `month` and `weekday`, or as a
/// `timestamp`; sending both or neither is rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// Outdoor temperature (°C)
    pub temperature: f64,
    #[serde(default, deserialize_with = "holiday_flag")]
    pub holiday: bool,
    #[serde(default)]
    pub hour: Option<i64>,
    #[serde(default)]
    pub day: Option<i64>,
    #[serde(default)]
    pub month: Option<i64>,
    /// Monday = 0
    #[serde(default)]
    pub weekday: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Required by extended-schema models
    #[serde(default)]
    pub trend: Option<TrendSource>,
}

impl PredictRequest {
    /// Resolve the calendar fields from whichever form was sent
    pub fn calendar(&self, validator: &Validator) -> Result<CalendarInputs, ApiError> {
        let fields = [
            ("hour", self.hour),
            ("day", self.day),
            ("month", self.month),
            ("weekday", self.weekday),
        ];
        let names = |present: bool| -> Vec<&'static str> {
            fields
                .iter()
                .filter(|(_, value)| value.is_some() == present)
                .map(|(name, _)| *name)
                .collect()
        };
        let given = names(true);

        match &self.timestamp {
            Some(_) if !given.is_empty() => Err(ApiError::InvalidRequest(format!(
                "send either a timestamp or calendar fields, not both (got timestamp and {})",
                given.join(", ")
            ))),
            Some(timestamp) => {
                let ts = CalendarInputs::parse_timestamp(timestamp)?;
                Ok(CalendarInputs::from_datetime(ts, self.temperature, self.holiday))
            }
            None if given.is_empty() => Err(ApiError::InvalidRequest(
                "either a timestamp or hour, day, month and weekday is required".to_string(),
            )),
            None => {
                let (Some(hour), Some(day), Some(month), Some(weekday)) =
                    (self.hour, self.day, self.month, self.weekday)
                else {
                    return Err(ApiError::InvalidRequest(format!(
                        "missing calendar field(s): {}",
                        names(false).join(", ")
                    )));
                };

                let config = validator.config();
                let narrowed = [
                    validator.narrow_calendar_value("hour", hour, config.hour_range),
                    validator.narrow_calendar_value("day", day, config.day_range),
                    validator.narrow_calendar_value("month", month, config.month_range),
                    validator.narrow_calendar_value("weekday", weekday, config.weekday_range),
                ];
                let errors: Vec<ValidationError> =
                    narrowed.iter().filter_map(|r| r.clone().err()).collect();
                if !errors.is_empty() {
                    return Err(ApiError::Validation(errors));
                }
                let [hour, day, month, weekday] = narrowed.map(|r| r.unwrap_or_default());

                Ok(CalendarInputs {
                    temperature: self.temperature,
                    holiday: self.holiday,
                    hour,
                    day,
                    month,
                    weekday,
                })
            }
        }
    }

    /// Resolve the trend statistics, if any were supplied
    pub fn trend(&self) -> Result<Option<TrendInputs>, ApiError> {
        match &self.trend {
            None => Ok(None),
            Some(TrendSource::Explicit(trend)) => Ok(Some(*trend)),
            Some(TrendSource::History { recent_demand }) => {
                Ok(Some(TrendInputs::from_history(recent_demand)?))
            }
        }
    }
}

/// Request body for the what-if endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WhatIfRequest {
    #[serde(flatten)]
    pub inputs: PredictRequest,
    /// Temperature offset (°C)
    #[serde(default = "default_delta")]
    pub temperature_delta: f64,
}

fn default_delta() -> f64 {
    WHAT_IF_TEMPERATURE_DELTA
}

/// One engineered feature
#[derive(Debug, Serialize)]
pub struct NamedFeature {
    pub name: &'static str,
    pub value: f64,
}

/// Prediction value with its display form and band
#[derive(Debug, Serialize)]
pub struct PredictionSummary {
    pub prediction_mw: f64,
    pub display: String,
    pub band: DemandBand,
    pub band_label: &'static str,
}

impl PredictionSummary {
    fn new(prediction_mw: f64, thresholds: &BandThresholds) -> Self {
        let band = DemandBand::classify(prediction_mw, thresholds);
        Self {
            prediction_mw,
            display: format_mw(prediction_mw),
            band,
            band_label: band.label(),
        }
    }
}

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub summary: PredictionSummary,
    pub message: &'static str,
    pub insights: Vec<&'static str>,
    pub schema: SchemaVariant,
    pub features: Vec<NamedFeature>,
    pub scaled: bool,
    pub latency_us: u64,
}

/// Response for the what-if endpoint
#[derive(Debug, Serialize)]
pub struct WhatIfResponse {
    pub temperature_delta: f64,
    pub baseline: PredictionSummary,
    pub adjusted: PredictionSummary,
    pub difference_mw: f64,
    pub difference_display: String,
}

fn named_features(record: &FeatureRecord) -> Vec<NamedFeature> {
    record
        .named()
        .map(|(name, value)| NamedFeature { name, value })
        .collect()
}

/// Validate the request and build the feature record for the engine's schema
fn build_record(
    state: &AppState,
    engine: &InferenceEngine,
    request: &PredictRequest,
) -> Result<(CalendarInputs, FeatureRecord), ApiError> {
    let calendar = request.calendar(&state.validator)?;
    let trend = request.trend()?;

    let mut validation = state.validator.validate_calendar(&calendar);
    if let Some(trend) = &trend {
        validation = validation.merge(state.validator.validate_trend(trend));
    }
    validation.into_result().map_err(ApiError::Validation)?;

    let record = engine.pipeline().build(&calendar, trend.as_ref())?;
    Ok((calendar, record))
}

/// Predict energy demand
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let engine = state.engine()?;
    let (calendar, record) = build_record(&state, engine, &request)?;
    let result = engine.predict(&record)?;

    metrics::counter!("demand_predictions_total").increment(1);
    metrics::histogram!("demand_prediction_mw").record(result.prediction_mw);
    metrics::histogram!("demand_inference_latency_us").record(result.latency_us as f64);

    let summary = PredictionSummary::new(result.prediction_mw, &state.thresholds);
    debug!("Predicted {} ({})", summary.display, summary.band_label);

    Ok(Json(PredictionResponse {
        message: summary.band.message(),
        summary,
        insights: explain(&calendar),
        schema: record.variant(),
        features: named_features(&record),
        scaled: result.scaled,
        latency_us: result.latency_us,
    }))
}

/// Compare the prediction with one at an offset temperature
pub async fn what_if(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WhatIfRequest>, JsonRejection>,
) -> Result<Json<WhatIfResponse>, ApiError> {
    let Json(request) = payload?;
    let engine = state.engine()?;
    let (_, record) = build_record(&state, engine, &request.inputs)?;
    let comparison = engine.what_if(&record, request.temperature_delta)?;

    metrics::counter!("demand_what_if_total").increment(1);

    let difference_mw = comparison.difference_mw();
    Ok(Json(WhatIfResponse {
        temperature_delta: comparison.temperature_delta,
        baseline: PredictionSummary::new(comparison.baseline.prediction_mw, &state.thresholds),
        adjusted: PredictionSummary::new(comparison.adjusted.prediction_mw, &state.thresholds),
        difference_mw,
        difference_display: format_mw(difference_mw),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use crate::AppConfig;
    use data_validator::ValidationConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use inference_engine::InferenceError;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post(router: axum::Router, uri: &str, body: Value) -> Response {
        router
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn basic_request(temperature: f64) -> Value {
        json!({
            "temperature": temperature,
            "holiday": false,
            "hour": 12,
            "day": 15,
            "month": 6,
            "weekday": 3
        })
    }

    #[tokio::test]
    async fn test_predict_basic() {
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", basic_request(30.0)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["prediction_mw"], 700.0);
        assert_eq!(body["display"], "700.00 MW");
        assert_eq!(body["band"], "moderate");
        assert_eq!(body["band_label"], "moderate demand");
        assert_eq!(body["schema"], "basic");
        assert_eq!(body["scaled"], false);

        let features: Vec<f64> = body["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["value"].as_f64().unwrap())
            .collect();
        assert_eq!(features, vec![30.0, 0.0, 12.0, 15.0, 6.0, 3.0, 360.0, 900.0]);
        assert_eq!(body["insights"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_predict_high_band() {
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", basic_request(35.0)).await;
        let body = body_json(response).await;
        assert_eq!(body["prediction_mw"], 750.0);
        assert_eq!(body["band_label"], "high demand");
    }

    #[tokio::test]
    async fn test_predict_from_timestamp() {
        let request = json!({
            "temperature": 10.0,
            "holiday": true,
            "timestamp": "15-06-2024 18:00"
        });
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let features = body["features"].as_array().unwrap();
        assert_eq!(features[1]["value"], 1.0);
        assert_eq!(features[2]["value"], 18.0);
        assert_eq!(features[5]["name"], "DayOfWeek");
        assert_eq!(features[5]["value"], 5.0);
        assert_eq!(body["band"], "low");
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range() {
        let mut request = basic_request(30.0);
        request["hour"] = json!(24);
        request["month"] = json!(13);
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_predict_rejects_calendar_and_timestamp() {
        let mut request = basic_request(30.5);
        request["timestamp"] = json!("01-01-2024 05:00");
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("not both"));
        assert!(error.contains("hour, day, month, weekday"));
    }

    #[tokio::test]
    async fn test_predict_requires_a_moment() {
        let request = json!({ "temperature": 20.0 });
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_partial_calendar() {
        let request = json!({ "temperature": 20.0, "hour": 8, "weekday": 1 });
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("day, month"));
    }

    #[tokio::test]
    async fn test_predict_hour_beyond_any_range() {
        let mut request = basic_request(30.0);
        request["hour"] = json!(300);
        request["weekday"] = json!(-1);
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let details = body["details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert!(details[0].as_str().unwrap().starts_with("hour value 300"));
        assert!(details[1].as_str().unwrap().starts_with("weekday value -1"));
    }

    #[tokio::test]
    async fn test_predict_holiday_flag() {
        let mut request = basic_request(30.0);
        request["holiday"] = json!(1);
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["features"][1]["value"], 1.0);

        request["holiday"] = json!(2);
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("holiday"));
    }

    #[tokio::test]
    async fn test_predict_malformed_body() {
        let response = router(Ok(basic_engine()))
            .oneshot(
                Request::post("/api/v1/predict")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"temperature\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_configured_temperature_clamp() {
        let config = AppConfig {
            validation: ValidationConfig {
                temperature_range: Some((-20.0, 45.0)),
                ..Default::default()
            },
            ..Default::default()
        };
        let app = router_with(Ok(basic_engine()), &config, None);

        let response = post(app.clone(), "/api/v1/predict", basic_request(40.0)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = post(app, "/api/v1/predict", basic_request(60.0)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["details"][0]
            .as_str()
            .unwrap()
            .starts_with("temperature value 60"));
    }

    #[tokio::test]
    async fn test_predict_bad_timestamp() {
        let request = json!({ "temperature": 20.0, "timestamp": "not a date" });
        let response = post(router(Ok(basic_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_extended_with_explicit_trend() {
        let mut request = basic_request(-10.0);
        request["hour"] = json!(0);
        request["trend"] = json!({
            "lag_1": 500.0,
            "lag_24": 480.0,
            "rolling_mean_3": 490.0,
            "rolling_std_3": 20.0
        });
        let response = post(router(Ok(extended_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["prediction_mw"], 490.0);
        assert_eq!(body["scaled"], true);
        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 13);
        assert_eq!(features[6]["value"], 0.0);
        assert_eq!(features[7]["value"], 100.0);
        assert_eq!(features[9]["name"], "Lag_1");
        assert_eq!(features[12]["value"], 20.0);
    }

    #[tokio::test]
    async fn test_predict_extended_from_history() {
        let history: Vec<f64> = (0..24).map(|i| 400.0 + i as f64).collect();
        let mut request = basic_request(20.0);
        request["trend"] = json!({ "recent_demand": history });
        let response = post(router(Ok(extended_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        // lag_1 = 423, plus temperature
        assert_eq!(body["prediction_mw"], 443.0);
        assert_eq!(body["features"][10]["value"], 400.0);
    }

    #[tokio::test]
    async fn test_predict_extended_requires_trend() {
        let response = post(router(Ok(extended_engine())), "/api/v1/predict", basic_request(20.0)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_short_history() {
        let mut request = basic_request(20.0);
        request["trend"] = json!({ "recent_demand": [500.0, 510.0, 520.0] });
        let response = post(router(Ok(extended_engine())), "/api/v1/predict", request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_degraded() {
        let load = Err(InferenceError::ModelLoadError("cannot read model".to_string()));
        let response = post(router(load), "/api/v1/predict", basic_request(30.0)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("cannot read model"));
    }

    #[tokio::test]
    async fn test_what_if_default_delta() {
        let response = post(
            router(Ok(basic_engine())),
            "/api/v1/predict/what-if",
            basic_request(25.0),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["temperature_delta"], 10.0);
        assert_eq!(body["baseline"]["prediction_mw"], 650.0);
        assert_eq!(body["adjusted"]["prediction_mw"], 750.0);
        assert_eq!(body["adjusted"]["band"], "high");
        assert_eq!(body["difference_mw"], 100.0);
        assert_eq!(body["difference_display"], "100.00 MW");
    }

    #[tokio::test]
    async fn test_what_if_custom_delta() {
        let mut request = basic_request(25.0);
        request["temperature_delta"] = json!(-5.0);
        let response = post(router(Ok(basic_engine())), "/api/v1/predict/what-if", request).await;

        let body = body_json(response).await;
        assert_eq!(body["adjusted"]["prediction_mw"], 600.0);
        assert_eq!(body["difference_mw"], -50.0);
    }
}
