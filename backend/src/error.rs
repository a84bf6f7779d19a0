use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;

/// Errors raised while turning a submission into a feature vector.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be a number (got {value:?})")]
    InvalidNumber { field: &'static str, value: String },

    /// Only produced when categorical values are checked strictly.
    #[error("field `{field}` has unrecognized value {value:?}")]
    UnknownCategory { field: &'static str, value: String },
}

/// Errors raised while loading or running the regression model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed linear model: {0}")]
    Format(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("ONNX model error: {0}")]
    Onnx(String),

    #[error("unsupported model format: {} (expected .onnx or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("inference task was cancelled: {0}")]
    Blocking(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Feature(_) => StatusCode::BAD_REQUEST,
            AppError::Model(_) | AppError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(&self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_errors_are_client_errors() {
        let err = AppError::from(FeatureError::MissingField("age"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "missing field `age`");
    }

    #[test]
    fn model_errors_are_server_errors() {
        let err = AppError::from(ModelError::Inference("empty output".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
