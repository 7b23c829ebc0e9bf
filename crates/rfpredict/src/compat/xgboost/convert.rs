//! Conversion from XGBoost JSON types to native rfpredict types.

use ndarray::Array1;

use crate::model::{
    default_feature_names, ForestModel, LinearRegression, Model, ModelMeta, OutputTransform,
    TaskKind,
};
use crate::repr::gbdt::{DecisionType, Forest, ForestValidationError, Tree};
use crate::repr::gblinear::LinearModel;

use super::json::{GradientBooster, ModelTrees, Tree as XgbTree, XgbModel};

/// Error type for XGBoost model conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("tree {0} has no nodes")]
    EmptyTree(usize),
    #[error(
        "invalid node index in tree {tree}: node {node} references child {child} but tree has {num_nodes} nodes"
    )]
    InvalidNodeIndex {
        tree: usize,
        node: usize,
        child: i32,
        num_nodes: usize,
    },
    #[error("tree {tree}: field {field} has {actual} entries but num_nodes is {num_nodes}")]
    TreeArrayLength {
        tree: usize,
        field: &'static str,
        actual: usize,
        num_nodes: usize,
    },
    #[error("gbtree_model_param declares {declared} trees but the model has {actual}")]
    TreeCount { declared: usize, actual: usize },
    #[error("tree_info has {actual} entries for {num_trees} trees")]
    TreeInfoLength { actual: usize, num_trees: usize },
    #[error("gblinear weights length {actual} doesn't match num_features + 1 = {expected}")]
    InvalidLinearWeights { actual: usize, expected: usize },
    #[error("models with {0} outputs are not supported; only single-output regressors")]
    MultiOutput(usize),
    #[error("tree {tree} node {node} has a categorical split, which is not supported")]
    CategoricalSplit { tree: usize, node: usize },
    #[error("objective {0} is not supported")]
    UnsupportedObjective(String),
    #[error("model lists {names} feature names for {n_features} features")]
    FeatureNameCount { names: usize, n_features: usize },
    #[error("duplicate feature name {0:?}")]
    DuplicateFeatureName(String),
    #[error(transparent)]
    InvalidForest(#[from] ForestValidationError),
}

/// How an objective's raw margin maps to the reported prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Identity,
    Logit,
    /// Logistic margin reported as is; `base_score` is still a probability.
    LogitRaw,
    Log,
}

fn objective_link(objective: &str) -> Result<Link, ConversionError> {
    match objective {
        "binary:logistic" | "reg:logistic" => Ok(Link::Logit),
        "binary:logitraw" => Ok(Link::LogitRaw),
        "count:poisson" | "reg:gamma" | "reg:tweedie" => Ok(Link::Log),
        name if name.starts_with("reg:") => Ok(Link::Identity),
        name => Err(ConversionError::UnsupportedObjective(name.to_string())),
    }
}

impl Link {
    fn output_transform(self) -> OutputTransform {
        match self {
            Link::Identity | Link::LogitRaw => OutputTransform::Identity,
            Link::Logit => OutputTransform::Sigmoid,
            Link::Log => OutputTransform::Exp,
        }
    }

    fn task(self) -> TaskKind {
        match self {
            Link::Logit | Link::LogitRaw => TaskKind::BinaryClassification,
            Link::Identity | Link::Log => TaskKind::Regression,
        }
    }

    /// Convert `base_score` from output space to margin space.
    ///
    /// XGBoost stores `base_score` untransformed but adds it to the margin,
    /// after its `ProbToMargin` step.
    fn prob_to_margin(self, base_score: f32) -> f64 {
        let base_score = f64::from(base_score);
        match self {
            Link::Identity => base_score,
            Link::Logit | Link::LogitRaw => {
                let p = base_score.clamp(1e-7, 1.0 - 1e-7);
                (p / (1.0 - p)).ln()
            }
            Link::Log => base_score.max(1e-7).ln(),
        }
    }
}

impl XgbModel {
    /// Convert to a native [`Model`].
    ///
    /// gbtree and dart boosters become a summing [`Forest`] with XGBoost's
    /// `<` split semantics; DART tree weights are folded into the leaves.
    /// gblinear becomes a [`LinearModel`] with the base score folded into
    /// the intercept.
    pub fn to_model(&self) -> Result<Model, ConversionError> {
        let param = &self.learner.learner_model_param;
        let n_outputs = param.n_class.max(param.num_target).max(1) as usize;
        if n_outputs > 1 {
            return Err(ConversionError::MultiOutput(n_outputs));
        }

        let link = objective_link(self.learner.objective.name())?;
        let meta = self.meta(link.task())?;
        let base_score = link.prob_to_margin(param.base_score);
        tracing::debug!(
            version = ?self.version,
            objective = self.learner.objective.name(),
            base_score,
            "converting XGBoost model"
        );

        let model = match &self.learner.gradient_booster {
            GradientBooster::Gbtree { model } => {
                let forest = convert_forest(model, None, base_score, meta.n_features())?;
                Model::Forest(ForestModel::new(meta, forest, link.output_transform()))
            }
            GradientBooster::Dart {
                gbtree,
                weight_drop,
            } => {
                let forest =
                    convert_forest(&gbtree.model, Some(weight_drop.as_slice()), base_score, meta.n_features())?;
                Model::Forest(ForestModel::new(meta, forest, link.output_transform()))
            }
            GradientBooster::Gblinear { model } => {
                let linear = convert_linear(&model.weights, base_score, meta.n_features())?;
                Model::Linear(LinearRegression::new(meta, linear, link.output_transform()))
            }
        };

        Ok(model)
    }

    fn meta(&self, task: TaskKind) -> Result<ModelMeta, ConversionError> {
        let n_features = self.learner.learner_model_param.n_features.max(0) as usize;
        let names = &self.learner.feature_names;

        let feature_names = if names.is_empty() {
            default_feature_names(n_features)
        } else if names.len() != n_features {
            return Err(ConversionError::FeatureNameCount {
                names: names.len(),
                n_features,
            });
        } else {
            names.clone()
        };

        let meta = ModelMeta {
            feature_names,
            task,
            objective_name: Some(self.learner.objective.name().to_string()),
        };
        if let Some(name) = meta.duplicate_feature_name() {
            return Err(ConversionError::DuplicateFeatureName(name.to_string()));
        }

        Ok(meta)
    }
}

fn convert_forest(
    model_trees: &ModelTrees,
    tree_weights: Option<&[f32]>,
    base_score: f64,
    n_features: usize,
) -> Result<Forest, ConversionError> {
    let declared = model_trees.gbtree_model_param.num_trees.max(0) as usize;
    if declared != model_trees.num_trees() {
        return Err(ConversionError::TreeCount {
            declared,
            actual: model_trees.num_trees(),
        });
    }

    // Every tree must feed output group 0.
    let tree_info = &model_trees.tree_info;
    if !tree_info.is_empty() && tree_info.len() != model_trees.num_trees() {
        return Err(ConversionError::TreeInfoLength {
            actual: tree_info.len(),
            num_trees: model_trees.num_trees(),
        });
    }
    if let Some(&group) = tree_info.iter().max() {
        if group > 0 {
            return Err(ConversionError::MultiOutput(group as usize + 1));
        }
    }

    let mut forest = Forest::boosted()
        .with_base_score(base_score)
        .with_decision_type(DecisionType::LessThan);

    for (tree_idx, xgb_tree) in model_trees.trees.iter().enumerate() {
        let mut tree = convert_tree(xgb_tree, tree_idx)?;
        if let Some(weight) = tree_weights.and_then(|w| w.get(tree_idx)) {
            tree.scale_leaves(f64::from(*weight));
        }
        forest.push_tree(tree);
    }

    forest.validate(n_features)?;
    tracing::debug!(
        n_trees = model_trees.num_trees(),
        num_parallel_tree = model_trees.gbtree_model_param.num_parallel_tree,
        dart = tree_weights.is_some(),
        "converted xgboost trees"
    );
    Ok(forest)
}

/// Convert a single XGBoost tree to a native [`Tree`].
fn convert_tree(xgb_tree: &XgbTree, tree_idx: usize) -> Result<Tree, ConversionError> {
    let num_nodes = xgb_tree.tree_param.num_nodes.max(0) as usize;
    if num_nodes == 0 {
        return Err(ConversionError::EmptyTree(tree_idx));
    }

    let lengths = [
        ("left_children", xgb_tree.left_children.len()),
        ("right_children", xgb_tree.right_children.len()),
        ("split_indices", xgb_tree.split_indices.len()),
        ("split_conditions", xgb_tree.split_conditions.len()),
        ("default_left", xgb_tree.default_left.len()),
    ];
    for (field, actual) in lengths {
        if actual != num_nodes {
            return Err(ConversionError::TreeArrayLength {
                tree: tree_idx,
                field,
                actual,
                num_nodes,
            });
        }
    }

    if let Some(&node) = xgb_tree.categories_nodes.first() {
        return Err(ConversionError::CategoricalSplit {
            tree: tree_idx,
            node: node.max(0) as usize,
        });
    }

    let mut split_indices = vec![0u32; num_nodes];
    let mut thresholds = vec![0.0f64; num_nodes];
    let mut left = vec![0u32; num_nodes];
    let mut right = vec![0u32; num_nodes];
    let mut default_left = vec![false; num_nodes];
    let mut is_leaf = vec![false; num_nodes];
    let mut leaf_values = vec![0.0f64; num_nodes];

    for node_idx in 0..num_nodes {
        let left_child = xgb_tree.left_children[node_idx];
        let right_child = xgb_tree.right_children[node_idx];

        // XGBoost marks leaves with left_child == -1 and keeps the leaf
        // value in split_conditions.
        if left_child == -1 {
            is_leaf[node_idx] = true;
            leaf_values[node_idx] = f64::from(xgb_tree.split_conditions[node_idx]);
            continue;
        }

        for child in [left_child, right_child] {
            if child < 0 || child as usize >= num_nodes {
                return Err(ConversionError::InvalidNodeIndex {
                    tree: tree_idx,
                    node: node_idx,
                    child,
                    num_nodes,
                });
            }
        }

        if xgb_tree.split_type.get(node_idx).copied().unwrap_or(0) == 1 {
            return Err(ConversionError::CategoricalSplit {
                tree: tree_idx,
                node: node_idx,
            });
        }

        split_indices[node_idx] = xgb_tree.split_indices[node_idx].max(0) as u32;
        thresholds[node_idx] = f64::from(xgb_tree.split_conditions[node_idx]);
        left[node_idx] = left_child as u32;
        right[node_idx] = right_child as u32;
        default_left[node_idx] = xgb_tree.default_left[node_idx] != 0;
    }

    Ok(Tree::new(
        split_indices,
        thresholds,
        left,
        right,
        default_left,
        is_leaf,
        leaf_values,
    ))
}

/// Convert gblinear weights to a [`LinearModel`].
///
/// The flat weights hold one coefficient per feature followed by the bias.
fn convert_linear(
    weights: &[f32],
    base_score: f64,
    n_features: usize,
) -> Result<LinearModel, ConversionError> {
    let expected = n_features + 1;
    if weights.len() != expected {
        return Err(ConversionError::InvalidLinearWeights {
            actual: weights.len(),
            expected,
        });
    }

    let coefficients: Array1<f64> = weights[..n_features].iter().map(|&w| f64::from(w)).collect();
    let bias = f64::from(weights[n_features]);

    Ok(LinearModel::new(coefficients, bias + base_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Regressor;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use serde_json::{json, Value};

    fn stump() -> Value {
        json!({
            "tree_param": {"num_nodes": "3", "num_feature": "2", "size_leaf_vector": "1"},
            "id": 0,
            "base_weights": [0.0, -10.0, 10.0],
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "parents": [2147483647, 0, 0],
            "split_indices": [1, 0, 0],
            "split_conditions": [0.5, -1.0, 1.0],
            "split_type": [0, 0, 0],
            "default_left": [1, 0, 0],
            "categories": [],
            "categories_nodes": [],
            "categories_segments": [],
            "categories_sizes": []
        })
    }

    fn learner(booster: Value, objective: &str, base_score: &str) -> XgbModel {
        serde_json::from_value(json!({
            "version": [2, 0, 3],
            "learner": {
                "feature_names": ["a", "b"],
                "gradient_booster": booster,
                "objective": {"name": objective},
                "learner_model_param": {
                    "base_score": base_score,
                    "num_class": "0",
                    "num_feature": "2",
                    "num_target": "1"
                }
            }
        }))
        .unwrap()
    }

    fn gbtree(trees: Vec<Value>) -> Value {
        let n = trees.len();
        let tree_info = vec![0; n];
        json!({
            "name": "gbtree",
            "model": {
                "trees": trees,
                "tree_info": tree_info,
                "gbtree_model_param": {"num_trees": n.to_string(), "num_parallel_tree": "1"}
            }
        })
    }

    #[test]
    fn gbtree_regression_uses_strict_less_than() {
        let model = learner(gbtree(vec![stump()]), "reg:squarederror", "0.5")
            .to_model()
            .unwrap();

        assert_eq!(model.kind(), "forest");
        assert_eq!(model.feature_names(), ["a", "b"]);
        // b == threshold goes right under `<`.
        assert_abs_diff_eq!(model.predict_row(array![0.0, 0.5].view()).unwrap(), 1.5);
        assert_abs_diff_eq!(model.predict_row(array![0.0, 0.4].view()).unwrap(), -0.5);
    }

    #[test]
    fn missing_value_follows_default_left() {
        let model = learner(gbtree(vec![stump()]), "reg:squarederror", "0")
            .to_model()
            .unwrap();
        let pred = model.predict_row(array![0.0, f64::NAN].view()).unwrap();
        assert_abs_diff_eq!(pred, -1.0);
    }

    #[test]
    fn logistic_base_score_in_margin_space() {
        let model = learner(gbtree(vec![stump()]), "binary:logistic", "5E-1")
            .to_model()
            .unwrap()
            .into_forest()
            .unwrap();

        assert_abs_diff_eq!(model.forest().base_score(), 0.0, epsilon = 1e-6);
        assert_eq!(model.output_transform(), OutputTransform::Sigmoid);
        assert_eq!(model.meta().task, TaskKind::BinaryClassification);
    }

    #[test]
    fn poisson_uses_exp_link() {
        let model = learner(gbtree(vec![stump()]), "count:poisson", "1")
            .to_model()
            .unwrap()
            .into_forest()
            .unwrap();
        assert_abs_diff_eq!(model.forest().base_score(), 0.0);
        assert_eq!(model.output_transform(), OutputTransform::Exp);
    }

    #[test]
    fn dart_weights_scale_leaves() {
        let booster = json!({
            "name": "dart",
            "gbtree": gbtree(vec![stump(), stump()]),
            "weight_drop": [1.0, 0.5]
        });
        let model = learner(booster, "reg:squarederror", "0").to_model().unwrap();

        let pred = model.predict_row(array![0.0, 1.0].view()).unwrap();
        assert_abs_diff_eq!(pred, 1.5);
    }

    #[test]
    fn gblinear_folds_base_score_into_bias() {
        let booster = json!({"name": "gblinear", "model": {"weights": [2.0, -1.0, 0.25]}});
        let model = learner(booster, "reg:squarederror", "0.5").to_model().unwrap();

        assert_eq!(model.kind(), "linear");
        let pred = model.predict_row(array![1.0, 2.0].view()).unwrap();
        assert_abs_diff_eq!(pred, 0.75);
    }

    #[test]
    fn gblinear_weight_length_checked() {
        let booster = json!({"name": "gblinear", "model": {"weights": [2.0, -1.0]}});
        let err = learner(booster, "reg:squarederror", "0.5").to_model().unwrap_err();
        assert!(matches!(
            err,
            ConversionError::InvalidLinearWeights { actual: 2, expected: 3 }
        ));
    }

    #[test]
    fn multiclass_rejected() {
        let mut model = learner(gbtree(vec![stump()]), "multi:softprob", "0.5");
        model.learner.learner_model_param.n_class = 3;
        assert!(matches!(model.to_model(), Err(ConversionError::MultiOutput(3))));
    }

    #[test]
    fn ranking_objective_rejected() {
        let model = learner(gbtree(vec![stump()]), "rank:pairwise", "0.5");
        assert!(matches!(
            model.to_model(),
            Err(ConversionError::UnsupportedObjective(ref name)) if name == "rank:pairwise"
        ));
    }

    #[test]
    fn categorical_split_rejected() {
        let mut tree = stump();
        tree["split_type"] = json!([1, 0, 0]);
        let model = learner(gbtree(vec![tree]), "reg:squarederror", "0.5");
        assert!(matches!(
            model.to_model(),
            Err(ConversionError::CategoricalSplit { tree: 0, node: 0 })
        ));
    }

    #[test]
    fn child_out_of_range_rejected() {
        let mut tree = stump();
        tree["right_children"] = json!([7, -1, -1]);
        let model = learner(gbtree(vec![tree]), "reg:squarederror", "0.5");
        assert!(matches!(
            model.to_model(),
            Err(ConversionError::InvalidNodeIndex { child: 7, .. })
        ));
    }

    #[test]
    fn leaf_values_come_from_split_conditions() {
        let mut tree = stump();
        tree["base_weights"] = json!([0.0, 10.0, 20.0]);
        tree["split_conditions"] = json!([0.5, 1.0, 2.0]);
        let model = learner(gbtree(vec![tree]), "reg:absoluteerror", "0.5")
            .to_model()
            .unwrap();

        assert_abs_diff_eq!(model.predict_row(array![0.0, 0.0].view()).unwrap(), 1.5);
        assert_abs_diff_eq!(model.predict_row(array![0.0, 1.0].view()).unwrap(), 2.5);
    }

    #[test]
    fn logitraw_base_score_in_margin_space() {
        let mut tree = stump();
        tree["split_conditions"] = json!([0.5, 0.0, 0.0]);
        let model = learner(gbtree(vec![tree]), "binary:logitraw", "5E-1")
            .to_model()
            .unwrap();

        assert_abs_diff_eq!(model.predict_row(array![0.0, 0.0].view()).unwrap(), 0.0, epsilon = 1e-6);
        let forest = model.into_forest().unwrap();
        assert_eq!(forest.output_transform(), OutputTransform::Identity);
        assert_eq!(forest.meta().task, TaskKind::BinaryClassification);
    }

    #[test]
    fn tree_count_must_match_declared() {
        let mut booster = gbtree(vec![stump()]);
        booster["model"]["gbtree_model_param"]["num_trees"] = json!("2");
        let model = learner(booster, "reg:squarederror", "0.5");
        assert!(matches!(
            model.to_model(),
            Err(ConversionError::TreeCount { declared: 2, actual: 1 })
        ));
    }

    #[test]
    fn trees_outside_group_zero_rejected() {
        let mut booster = gbtree(vec![stump(), stump()]);
        booster["model"]["tree_info"] = json!([0, 1]);
        let model = learner(booster, "reg:squarederror", "0.5");
        assert!(matches!(model.to_model(), Err(ConversionError::MultiOutput(2))));

        let mut booster = gbtree(vec![stump(), stump()]);
        booster["model"]["tree_info"] = json!([0]);
        let model = learner(booster, "reg:squarederror", "0.5");
        assert!(matches!(
            model.to_model(),
            Err(ConversionError::TreeInfoLength { actual: 1, num_trees: 2 })
        ));
    }

    #[test]
    fn default_feature_names_when_absent() {
        let mut model = learner(gbtree(vec![stump()]), "reg:squarederror", "0.5");
        model.learner.feature_names.clear();
        let converted = model.to_model().unwrap();
        assert_eq!(converted.feature_names(), ["f0", "f1"]);
    }
}
