//! High-level model types and the prediction capability interface.
//!
//! A loaded model is a [`Model`]: either a tree ensemble ([`ForestModel`]) or
//! a linear model ([`LinearRegression`]), each bundled with its
//! [`ModelMeta`] and [`OutputTransform`]. Callers only need the
//! [`Regressor`] trait: declared feature names plus single-row prediction.
//!
//! Loading from disk lives in [`crate::persist`].

mod meta;
mod transform;

pub use meta::{default_feature_names, ModelMeta, TaskKind};
pub use transform::OutputTransform;

use ndarray::ArrayView1;

use crate::error::{PredictError, Result};
use crate::repr::gbdt::Forest;
use crate::repr::gblinear::LinearModel;

// =============================================================================
// Regressor
// =============================================================================

/// Minimal prediction capability of a loaded model.
pub trait Regressor {
    /// Feature names in the order [`predict_row`](Self::predict_row) expects them.
    fn feature_names(&self) -> &[String];

    /// Predict a single row whose values follow [`feature_names`](Self::feature_names).
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64>;

    /// Number of features the model consumes.
    fn n_features(&self) -> usize {
        self.feature_names().len()
    }
}

fn check_row_len(expected: usize, row: &ArrayView1<'_, f64>) -> Result<()> {
    if row.len() != expected {
        return Err(PredictError::Prediction(format!(
            "expected {expected} features, got {}",
            row.len()
        )));
    }
    Ok(())
}

// =============================================================================
// ForestModel
// =============================================================================

/// Tree ensemble with metadata.
#[derive(Debug, Clone)]
pub struct ForestModel {
    meta: ModelMeta,
    forest: Forest,
    output_transform: OutputTransform,
}

impl ForestModel {
    pub fn new(meta: ModelMeta, forest: Forest, output_transform: OutputTransform) -> Self {
        Self {
            meta,
            forest,
            output_transform,
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn output_transform(&self) -> OutputTransform {
        self.output_transform
    }
}

impl Regressor for ForestModel {
    fn feature_names(&self) -> &[String] {
        &self.meta.feature_names
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        check_row_len(self.meta.n_features(), &row)?;

        // Trees are learned on f32 inputs; compare at that precision.
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let margin = self.forest.predict_row(&features);
        tracing::trace!(margin, n_trees = self.forest.n_trees(), "forest margin");

        Ok(self.output_transform.apply(margin))
    }
}

// =============================================================================
// LinearRegression
// =============================================================================

/// Linear model with metadata.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    meta: ModelMeta,
    linear: LinearModel,
    output_transform: OutputTransform,
}

impl LinearRegression {
    pub fn new(meta: ModelMeta, linear: LinearModel, output_transform: OutputTransform) -> Self {
        Self {
            meta,
            linear,
            output_transform,
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn linear(&self) -> &LinearModel {
        &self.linear
    }

    pub fn output_transform(&self) -> OutputTransform {
        self.output_transform
    }
}

impl Regressor for LinearRegression {
    fn feature_names(&self) -> &[String] {
        &self.meta.feature_names
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        check_row_len(self.meta.n_features(), &row)?;

        let margin = self.linear.predict_row(row);
        tracing::trace!(margin, "linear margin");

        Ok(self.output_transform.apply(margin))
    }
}

// =============================================================================
// Model
// =============================================================================

/// Any model this crate can load and predict with.
#[derive(Debug, Clone)]
pub enum Model {
    /// Tree ensemble (random forest, gradient boosted trees, DART).
    Forest(ForestModel),
    /// Linear model.
    Linear(LinearRegression),
}

impl Model {
    /// Short name of the model family, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Model::Forest(_) => "forest",
            Model::Linear(_) => "linear",
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        match self {
            Model::Forest(m) => m.meta(),
            Model::Linear(m) => m.meta(),
        }
    }

    /// Unwrap the tree ensemble, if this is one.
    pub fn into_forest(self) -> Option<ForestModel> {
        match self {
            Model::Forest(m) => Some(m),
            Model::Linear(_) => None,
        }
    }

    /// Unwrap the linear model, if this is one.
    pub fn into_linear(self) -> Option<LinearRegression> {
        match self {
            Model::Linear(m) => Some(m),
            Model::Forest(_) => None,
        }
    }
}

impl From<ForestModel> for Model {
    fn from(model: ForestModel) -> Self {
        Model::Forest(model)
    }
}

impl From<LinearRegression> for Model {
    fn from(model: LinearRegression) -> Self {
        Model::Linear(model)
    }
}

impl Regressor for Model {
    fn feature_names(&self) -> &[String] {
        match self {
            Model::Forest(m) => m.feature_names(),
            Model::Linear(m) => m.feature_names(),
        }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        match self {
            Model::Forest(m) => m.predict_row(row),
            Model::Linear(m) => m.predict_row(row),
        }
    }
}
