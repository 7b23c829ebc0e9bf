//! Canonical forest representation (collection of trees).

use super::tree::{DecisionType, Tree, TreeValidationError};

/// How per-tree leaf values are combined into a single margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Sum of leaf values (gradient boosting).
    #[default]
    Sum,
    /// Average of leaf values (random forests, bagging).
    Mean,
}

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("averaging forest has no trees")]
    EmptyMeanForest,
    #[error("tree {tree_idx}: {error}")]
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
    #[error("tree {tree_idx} splits on feature {feature} but model has {n_features} features")]
    FeatureOutOfRange {
        tree_idx: usize,
        feature: u32,
        n_features: usize,
    },
}

/// Forest of decision trees with a single output.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f64,
    aggregation: Aggregation,
    decision_type: DecisionType,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new(Aggregation::Sum)
    }
}

impl Forest {
    /// Create an empty forest with the given aggregation.
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            trees: Vec::new(),
            base_score: 0.0,
            aggregation,
            decision_type: DecisionType::default(),
        }
    }

    /// Create an empty boosted (summing) forest.
    pub fn boosted() -> Self {
        Self::new(Aggregation::Sum)
    }

    /// Create an empty averaging forest.
    pub fn averaged() -> Self {
        Self::new(Aggregation::Mean)
    }

    /// Set the base score added to the aggregated leaf values.
    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    /// Set the split comparison used by every tree.
    pub fn with_decision_type(mut self, decision_type: DecisionType) -> Self {
        self.decision_type = decision_type;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    #[inline]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    #[inline]
    pub fn decision_type(&self) -> DecisionType {
        self.decision_type
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Validate every tree and check that splits only reference the first
    /// `n_features` features.
    pub fn validate(&self, n_features: usize) -> Result<(), ForestValidationError> {
        if self.aggregation == Aggregation::Mean && self.trees.is_empty() {
            return Err(ForestValidationError::EmptyMeanForest);
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;

            if let Some(feature) = tree.max_split_index() {
                if feature as usize >= n_features {
                    return Err(ForestValidationError::FeatureOutOfRange {
                        tree_idx,
                        feature,
                        n_features,
                    });
                }
            }
        }

        Ok(())
    }

    /// Raw margin for a single row of features.
    pub fn predict_row(&self, features: &[f32]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_row(features, self.decision_type))
            .sum();

        let aggregated = match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Mean => total / self.trees.len() as f64,
        };

        self.base_score + aggregated
    }
}
