//! Output transformation for inference.
//!
//! The [`OutputTransform`] enum defines how raw model outputs (margins)
//! are converted to final predictions. This is persisted with the model
//! so that inference doesn't require the original objective.

/// Inference-time output transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    /// No transformation; output = margin.
    #[default]
    Identity,

    /// Logistic sigmoid: output = 1 / (1 + exp(-margin)).
    /// Used for binary classification and logistic regression.
    Sigmoid,

    /// Exponential: output = exp(margin).
    /// Used for log-link objectives (Poisson, Gamma, Tweedie).
    Exp,
}

impl OutputTransform {
    /// Apply the transformation to a single margin.
    ///
    /// NaN and Inf inputs propagate through without panics.
    #[inline]
    pub fn apply(&self, margin: f64) -> f64 {
        match self {
            OutputTransform::Identity => margin,
            OutputTransform::Sigmoid => sigmoid(margin),
            OutputTransform::Exp => margin.exp(),
        }
    }
}

/// Numerically stable sigmoid.
#[inline]
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
