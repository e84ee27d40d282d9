//! Demand Banding and Display

use serde::{Deserialize, Serialize};

/// Thresholds separating the qualitative demand bands (MW)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    /// Predictions strictly above this are high demand
    pub high_mw: f64,
    /// Predictions strictly above this (and not high) are moderate demand
    pub moderate_mw: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            high_mw: 700.0,
            moderate_mw: 500.0,
        }
    }
}

/// Qualitative demand band of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandBand {
    High,
    Moderate,
    Low,
}

impl DemandBand {
    /// Classify a prediction; both boundaries are exclusive
    pub fn classify(prediction_mw: f64, thresholds: &BandThresholds) -> Self {
        if prediction_mw > thresholds.high_mw {
            DemandBand::High
        } else if prediction_mw > thresholds.moderate_mw {
            DemandBand::Moderate
        } else {
            DemandBand::Low
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandBand::High => "high",
            DemandBand::Moderate => "moderate",
            DemandBand::Low => "low",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            DemandBand::High => "high demand",
            DemandBand::Moderate => "moderate demand",
            DemandBand::Low => "low demand",
        }
    }

    /// Message shown next to the prediction
    pub fn message(&self) -> &'static str {
        match self {
            DemandBand::High => "High demand expected: prepare peak capacity and load management",
            DemandBand::Moderate => "Moderate demand expected: normal operating margins apply",
            DemandBand::Low => "Low demand expected: consider scheduling maintenance or storage charging",
        }
    }
}

/// Format a demand value with two decimals and its unit
pub fn format_mw(value: f64) -> String {
    format!("{:.2} MW", value)
}
