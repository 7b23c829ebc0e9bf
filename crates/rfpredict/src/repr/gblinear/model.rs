//! Linear model data structure.

use ndarray::{Array1, ArrayView1};

/// Single-output linear model (coefficients + intercept).
///
/// ```text
/// output = intercept + Σ coefficients[i] · x[i]
/// ```
///
/// Missing (NaN) features contribute nothing to the sum, the same way a
/// linear booster skips missing entries.
///
/// # Example
///
/// ```
/// use rfpredict::repr::gblinear::LinearModel;
/// use ndarray::array;
///
/// let model = LinearModel::new(array![0.5, 2.0], 1.0);
///
/// assert_eq!(model.n_features(), 2);
/// assert_eq!(model.predict_row(array![2.0, 3.0].view()), 8.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Create a linear model from coefficients and an intercept.
    pub fn new(coefficients: Array1<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Create a zero-initialized linear model.
    pub fn zeros(n_features: usize) -> Self {
        Self::new(Array1::zeros(n_features), 0.0)
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Coefficient for a feature.
    #[inline]
    pub fn weight(&self, feature: usize) -> f64 {
        self.coefficients[feature]
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// All coefficients as a view.
    #[inline]
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    /// Raw margin for a single row.
    ///
    /// `features.len()` must equal [`n_features`](Self::n_features).
    pub fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(features.len(), self.n_features());

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.iter())
            .filter(|(_, x)| !x.is_nan())
            .map(|(w, x)| w * x)
            .sum();

        self.intercept + dot
    }
}
