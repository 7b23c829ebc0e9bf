//! Model metadata.
//!
//! Shared metadata types for model introspection.

use std::collections::HashSet;

/// Type of machine learning task the model was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskKind {
    /// Regression (continuous target).
    #[default]
    Regression,
    /// Binary classification; the prediction is a probability.
    BinaryClassification,
}

impl TaskKind {
    /// Returns true if this is a regression task.
    pub fn is_regression(&self) -> bool {
        matches!(self, Self::Regression)
    }
}

/// Shared metadata for all model types.
///
/// Feature names are always resolved: models persisted without names get the
/// positional defaults `f0, f1, ...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMeta {
    /// Feature names in the order the model consumes them.
    pub feature_names: Vec<String>,
    /// Task type.
    pub task: TaskKind,
    /// Objective name (for debugging/reproducibility).
    pub objective_name: Option<String>,
}

impl ModelMeta {
    /// Create metadata for a regression task over the given features.
    pub fn for_regression<I, S>(feature_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_names: feature_names.into_iter().map(Into::into).collect(),
            task: TaskKind::Regression,
            objective_name: None,
        }
    }

    /// Create metadata with positional feature names `f0 .. f{n-1}`.
    pub fn with_default_names(n_features: usize) -> Self {
        Self::for_regression(default_feature_names(n_features))
    }

    /// Set the task.
    pub fn with_task(mut self, task: TaskKind) -> Self {
        self.task = task;
        self
    }

    /// Set the objective name.
    pub fn with_objective_name(mut self, name: impl Into<String>) -> Self {
        self.objective_name = Some(name.into());
        self
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// First feature name that appears more than once, if any.
    pub fn duplicate_feature_name(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.feature_names.len());
        self.feature_names
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }
}

/// Positional feature names `f0 .. f{n-1}`.
pub fn default_feature_names(n_features: usize) -> Vec<String> {
    (0..n_features).map(|i| format!("f{i}")).collect()
}
