//! Compatibility layers for models trained by other libraries.

pub mod xgboost;
