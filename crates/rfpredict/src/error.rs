//! Error types for prediction.

use std::path::PathBuf;

use thiserror::Error;

use crate::persist::ReadError;

/// Errors that can occur while producing a prediction.
///
/// Every variant renders as a single human-readable line.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The model path does not exist.
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The model path exists but could not be deserialized.
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] ReadError),

    /// The parameters argument is not a JSON object.
    #[error("invalid parameters: {0}")]
    ParameterParse(String),

    /// A feature the model requires is absent from the parameters.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter is present but cannot be coerced to a number.
    #[error("Invalid value for parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The model rejected the assembled feature row.
    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Result type alias for prediction operations.
pub type Result<T> = std::result::Result<T, PredictError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let errors = [
            PredictError::ModelNotFound(PathBuf::from("missing.pkl")),
            PredictError::ParameterParse("expected value at line 1 column 1".into()),
            PredictError::MissingParameter("y".into()),
            PredictError::InvalidParameter {
                name: "x".into(),
                reason: "could not convert string to float: 'abc'".into(),
            },
            PredictError::Prediction("expected 2 features, got 1".into()),
        ];

        for err in &errors {
            assert!(!err.to_string().contains('\n'), "multi-line: {err}");
        }
    }

    #[test]
    fn model_not_found_message() {
        let err = PredictError::ModelNotFound(PathBuf::from("missing.pkl"));
        assert_eq!(err.to_string(), "Model file not found: missing.pkl");
    }

    #[test]
    fn missing_parameter_message() {
        let err = PredictError::MissingParameter("y".into());
        assert_eq!(err.to_string(), "Missing parameter: y");
    }
}
