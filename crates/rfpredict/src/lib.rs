//! rfpredict: single-row inference for persisted regression models.
//!
//! Loads a trained tree ensemble or linear model, resolves the model's
//! declared features against a JSON object of named parameters, and returns
//! one prediction.
//!
//! # Key Types
//!
//! - [`Model`] - A loaded model; implements [`Regressor`]
//! - [`ParameterSet`] - Named inputs for one request
//! - [`Predictor`] / [`predict`] - The load → assemble → predict pipeline
//! - [`PredictError`] - Everything that can go wrong along the way
//!
//! # Model Files
//!
//! Native documents are described in [`persist::schema`]. XGBoost JSON
//! models (`Booster.save_model("model.json")`) load through
//! [`compat::xgboost`].
//!
//! # Example
//!
//! ```no_run
//! use rfpredict::{predict, ParameterSet};
//!
//! let params = ParameterSet::parse(r#"{"x": 2.5, "y": "4"}"#)?;
//! let value = predict("model.json", &params)?;
//! println!("{value:?}");
//! # Ok::<(), rfpredict::PredictError>(())
//! ```

pub mod cli;
pub mod compat;
pub mod error;
pub mod model;
pub mod params;
pub mod persist;
pub mod predict;
pub mod repr;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{PredictError, Result};
pub use model::{Model, ModelMeta, OutputTransform, Regressor, TaskKind};
pub use params::ParameterSet;
pub use persist::{ModelFormat, ReadError};
pub use predict::{predict, predict_with, Predictor};
