//! Model persistence.
//!
//! Reads model artifacts from disk into [`Model`]. Two encodings are
//! understood:
//!
//! - the native JSON document ([`schema::ModelDocument`]), versioned by
//!   `format_version`;
//! - XGBoost JSON models as written by `Booster.save_model("model.json")`.
//!
//! The file is read fully and parsed once into a [`serde_json::Value`]; the
//! top-level keys decide which decoder runs unless a [`ModelFormat`] is
//! forced.
//!
//! # Example
//!
//! ```no_run
//! use rfpredict::model::{Model, Regressor};
//!
//! let model = Model::load("model.json")?;
//! println!("{:?}", model.feature_names());
//! # Ok::<(), rfpredict::persist::ReadError>(())
//! ```

mod convert;
mod error;
pub mod schema;

pub use error::ReadError;

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::compat::xgboost::XgbModel;
use crate::model::{ForestModel, LinearRegression, Model};
use schema::{ForestModelSchema, LinearModelSchema, ModelDocument, ModelTypeSchema, FORMAT_VERSION};

/// Encoding of a model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFormat {
    /// Decide from the document's top-level keys.
    #[default]
    Auto,
    /// Native `rfpredict` document.
    Native,
    /// XGBoost JSON model.
    Xgboost,
}

/// Detect the encoding of a parsed document.
///
/// Returns `None` for anything that is neither a native document nor an
/// XGBoost model.
pub fn detect_format(value: &Value) -> Option<ModelFormat> {
    let object = value.as_object()?;
    if object.contains_key("format_version") {
        Some(ModelFormat::Native)
    } else if object.contains_key("learner") {
        Some(ModelFormat::Xgboost)
    } else {
        None
    }
}

impl Model {
    /// Load a model from a file, detecting its format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        Self::load_with_format(path, ModelFormat::Auto)
    }

    /// Load a model from a file in the given format.
    pub fn load_with_format(path: impl AsRef<Path>, format: ModelFormat) -> Result<Self, ReadError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), ?format, "loading model");

        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes, format)
    }

    /// Read a model from any reader.
    pub fn read_json<R: Read>(mut reader: R, format: ModelFormat) -> Result<Self, ReadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_slice(&bytes, format)
    }

    /// Decode a model from raw JSON bytes.
    pub fn from_slice(bytes: &[u8], format: ModelFormat) -> Result<Self, ReadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value, format)
    }

    /// Decode a model from an already-parsed JSON document.
    pub fn from_value(value: Value, format: ModelFormat) -> Result<Self, ReadError> {
        let format = match format {
            ModelFormat::Auto => detect_format(&value).ok_or(ReadError::UnknownFormat)?,
            forced => forced,
        };
        tracing::debug!(?format, "decoding model document");

        // `detect_format` never yields `Auto`.
        let model = match format {
            ModelFormat::Native | ModelFormat::Auto => read_native(value)?,
            ModelFormat::Xgboost => {
                let xgb: XgbModel = serde_json::from_value(value)?;
                xgb.to_model()?
            }
        };

        tracing::debug!(
            kind = model.kind(),
            n_features = model.meta().n_features(),
            "model loaded"
        );
        Ok(model)
    }
}

fn read_native(value: Value) -> Result<Model, ReadError> {
    let doc: ModelDocument = serde_json::from_value(value)?;
    if doc.format_version != FORMAT_VERSION {
        return Err(ReadError::UnsupportedVersion {
            found: doc.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let model = match doc.model_type {
        ModelTypeSchema::Forest => {
            let schema: ForestModelSchema = serde_json::from_value(doc.model)?;
            Model::Forest(ForestModel::try_from(schema)?)
        }
        ModelTypeSchema::Linear => {
            let schema: LinearModelSchema = serde_json::from_value(doc.model)?;
            Model::Linear(LinearRegression::try_from(schema)?)
        }
    };

    Ok(model)
}
