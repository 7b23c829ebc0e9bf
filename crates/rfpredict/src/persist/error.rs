//! Errors raised while reading a model artifact.

use thiserror::Error;

use crate::compat::xgboost::ConversionError;

/// Errors that can occur while reading a model.
#[derive(Debug, Error)]
pub enum ReadError {
    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not JSON, or the JSON does not match the expected schema.
    #[error("malformed model document: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is neither a native document nor an XGBoost model.
    #[error("unrecognized model format: expected a native model document or an XGBoost JSON model")]
    UnknownFormat,

    /// The document was written by a newer (or unknown) schema version.
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The document parsed but violates a structural invariant.
    #[error("invalid model: {0}")]
    Validation(String),

    /// An XGBoost model could not be converted to native types.
    #[error("cannot convert XGBoost model: {0}")]
    Conversion(#[from] ConversionError),
}
