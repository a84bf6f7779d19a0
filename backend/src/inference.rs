use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tract_onnx::prelude::*;

use crate::error::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// A loaded regression model. Implementations are immutable after loading
/// and shared across all workers.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f32, ModelError>;

    fn info(&self) -> ModelInfo;
}

/// Loads the model at `path`, picking the backend from the file extension.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Arc<dyn Predictor>, ModelError> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("onnx") => Ok(Arc::new(OnnxModel::load(path)?)),
        Some("json") => Ok(Arc::new(LinearModel::load(path)?)),
        _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// ONNX graph (e.g. a scikit-learn regressor exported with skl2onnx) taking a
/// `[1, 9]` f32 input.
pub struct OnnxModel {
    plan: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    source: PathBuf,
}

impl OnnxModel {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, ModelError> {
        let path = model_path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ModelError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let plan = tract_onnx::onnx()
            .model_for_path(&path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ModelError::Onnx(format!("{e:#}")))?;

        Ok(Self { plan, source: path })
    }
}

impl Predictor for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> Result<f32, ModelError> {
        let input = features.as_array();
        let tensor = Tensor::from_shape(&[1, FEATURE_COUNT], input.as_slice())
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ModelError::Inference(format!("{e:#}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| ModelError::Inference("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        view.iter()
            .next()
            .copied()
            .ok_or_else(|| ModelError::Inference("model output is empty".into()))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("onnx", Some(self.source.as_path()))
    }
}

/// Linear regression stored as JSON: `{"intercept": .., "coefficients": [..]}`
/// with one coefficient per feature, in feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f32,
    pub coefficients: Vec<f32>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl LinearModel {
    pub fn new(intercept: f32, coefficients: Vec<f32>) -> Result<Self, ModelError> {
        let model = Self {
            intercept,
            coefficients,
            source: None,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut model: LinearModel = serde_json::from_str(&raw)?;
        model.validate()?;
        model.source = Some(path.to_path_buf());
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::InvalidModel(format!(
                "expected {} coefficients, found {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidModel(
                "intercept and coefficients must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f32, ModelError> {
        let dot: f32 = self
            .coefficients
            .iter()
            .zip(features.as_array())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("linear", self.source.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub backend: String,
    pub source: Option<String>,
    pub input_shape: Vec<usize>,
    pub features: Vec<String>,
    pub version: String,
}

impl ModelInfo {
    pub fn new(backend: &str, source: Option<&Path>) -> Self {
        ModelInfo {
            backend: backend.to_string(),
            source: source.map(|p| p.display().to_string()),
            input_shape: vec![1, FEATURE_COUNT],
            features: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
