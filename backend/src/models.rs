use std::time::Instant;

use serde::Serialize;

use crate::features::FeatureVector;

/// Result of one cost prediction as returned by the JSON API.
#[derive(Debug, Serialize, Clone)]
pub struct PredictionResult {
    pub predicted_cost: f32,
    pub features: FeatureVector,
    pub model_backend: String,
    pub timestamp: String,
}

impl PredictionResult {
    pub fn new(predicted_cost: f32, features: FeatureVector, model_backend: &str) -> Self {
        PredictionResult {
            predicted_cost,
            features,
            model_backend: model_backend.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Envelope shared by every `/api` response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn elapsed_since(mut self, start: Instant) -> Self {
        self.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        self
    }
}
