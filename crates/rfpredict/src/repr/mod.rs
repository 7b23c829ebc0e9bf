//! Canonical model representations.
//!
//! These are the runtime types prediction runs on. Persisted formats
//! (native JSON, XGBoost JSON) are converted into them at load time.

pub mod gbdt;
pub mod gblinear;
