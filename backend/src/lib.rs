//! Insurance cost prediction service.
//!
//! An HTML form and a small JSON API in front of a pre-trained regression
//! model. Submissions are encoded into a fixed nine-column feature vector
//! (see [`features`]) and scored by the model loaded once at startup
//! (see [`inference`]).

pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod routes;
pub mod templates;

pub use config::ServerConfig;
pub use error::{AppError, FeatureError, ModelError};
pub use features::{Applicant, ApplicantForm, CategoryPolicy, FeatureVector};
pub use inference::{load_model, LinearModel, ModelInfo, OnnxModel, Predictor};
pub use routes::AppState;
