//! Single-row prediction from a model file and named parameters.
//!
//! [`predict`] is the whole pipeline: load the model, resolve its declared
//! features against the [`ParameterSet`], predict, and return the scalar.
//! [`Predictor`] carries the (optional) format override and nothing else, so
//! repeated calls with the same inputs produce the same result.

use std::path::Path;

use crate::error::{PredictError, Result};
use crate::model::{Model, Regressor};
use crate::params::ParameterSet;
use crate::persist::ModelFormat;

/// Load the model at `model_path` and predict one row from `parameters`.
///
/// # Errors
///
/// - [`PredictError::ModelNotFound`] if `model_path` does not exist
/// - [`PredictError::ModelLoad`] if the file is not a readable model
/// - [`PredictError::MissingParameter`] naming the first declared feature
///   absent from `parameters`
/// - [`PredictError::InvalidParameter`] for a value that is not numeric
pub fn predict(model_path: impl AsRef<Path>, parameters: &ParameterSet) -> Result<f64> {
    Predictor::new().predict(model_path, parameters)
}

/// Predict one row with an already-loaded model.
///
/// Parameters are resolved in the model's declared feature order.
pub fn predict_with<R: Regressor + ?Sized>(model: &R, parameters: &ParameterSet) -> Result<f64> {
    let row = parameters.assemble(model.feature_names())?;
    model.predict_row(row.view())
}

/// Stateless prediction entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Predictor {
    format: ModelFormat,
}

impl Predictor {
    /// Predictor that detects the model format from the file contents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a model format instead of detecting it.
    pub fn with_format(mut self, format: ModelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    /// Load a model, mapping a nonexistent path to
    /// [`PredictError::ModelNotFound`].
    pub fn load(&self, model_path: impl AsRef<Path>) -> Result<Model> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(PredictError::ModelNotFound(path.to_path_buf()));
        }

        Ok(Model::load_with_format(path, self.format)?)
    }

    /// Load the model at `model_path` and predict one row from `parameters`.
    pub fn predict(&self, model_path: impl AsRef<Path>, parameters: &ParameterSet) -> Result<f64> {
        let model = self.load(model_path)?;
        let prediction = predict_with(&model, parameters)?;
        tracing::info!(prediction, model = model.kind(), "prediction complete");
        Ok(prediction)
    }
}
