//! Conversion from schema types to runtime types.
//!
//! Conversions are implemented as `TryFrom` so that every structural
//! invariant is checked once, at load time. Prediction code can then index
//! the runtime arrays without further checks.

use ndarray::Array1;

use super::error::ReadError;
use super::schema::{
    AggregationSchema, DecisionTypeSchema, ForestModelSchema, ForestSchema,
    LinearModelSchema, ModelMetaSchema, OutputTransformSchema, TaskKindSchema, TreeSchema,
};
use crate::model::{
    default_feature_names, ForestModel, LinearRegression, ModelMeta, OutputTransform, TaskKind,
};
use crate::repr::gbdt::{Aggregation, DecisionType, Forest, Tree};
use crate::repr::gblinear::LinearModel;

// =============================================================================
// Enum conversions
// =============================================================================

impl From<TaskKindSchema> for TaskKind {
    fn from(task: TaskKindSchema) -> Self {
        match task {
            TaskKindSchema::Regression => TaskKind::Regression,
            TaskKindSchema::BinaryClassification => TaskKind::BinaryClassification,
        }
    }
}

impl From<AggregationSchema> for Aggregation {
    fn from(agg: AggregationSchema) -> Self {
        match agg {
            AggregationSchema::Sum => Aggregation::Sum,
            AggregationSchema::Mean => Aggregation::Mean,
        }
    }
}

impl From<DecisionTypeSchema> for DecisionType {
    fn from(dt: DecisionTypeSchema) -> Self {
        match dt {
            DecisionTypeSchema::LessThan => DecisionType::LessThan,
            DecisionTypeSchema::LessOrEqual => DecisionType::LessOrEqual,
        }
    }
}

impl From<OutputTransformSchema> for OutputTransform {
    fn from(t: OutputTransformSchema) -> Self {
        match t {
            OutputTransformSchema::Identity => OutputTransform::Identity,
            OutputTransformSchema::Sigmoid => OutputTransform::Sigmoid,
            OutputTransformSchema::Exp => OutputTransform::Exp,
        }
    }
}

/// Explicit transform if persisted, otherwise the task's natural one.
fn resolve_transform(schema: Option<OutputTransformSchema>, task: TaskKind) -> OutputTransform {
    match (schema, task) {
        (Some(t), _) => t.into(),
        (None, TaskKind::Regression) => OutputTransform::Identity,
        (None, TaskKind::BinaryClassification) => OutputTransform::Sigmoid,
    }
}

// =============================================================================
// ModelMeta conversions
// =============================================================================

impl TryFrom<ModelMetaSchema> for ModelMeta {
    type Error = ReadError;

    fn try_from(schema: ModelMetaSchema) -> Result<Self, Self::Error> {
        let feature_names = match schema.feature_names {
            Some(names) => {
                if names.len() != schema.num_features {
                    return Err(ReadError::Validation(format!(
                        "meta declares {} features but lists {} feature names",
                        schema.num_features,
                        names.len()
                    )));
                }
                names
            }
            None => default_feature_names(schema.num_features),
        };

        let meta = ModelMeta {
            feature_names,
            task: schema.task.into(),
            objective_name: schema.objective_name,
        };

        if let Some(name) = meta.duplicate_feature_name() {
            return Err(ReadError::Validation(format!(
                "duplicate feature name {name:?}"
            )));
        }

        Ok(meta)
    }
}

// =============================================================================
// Tree conversions
// =============================================================================

impl TryFrom<TreeSchema> for Tree {
    type Error = ReadError;

    fn try_from(schema: TreeSchema) -> Result<Self, Self::Error> {
        let n_nodes = schema.num_nodes as usize;

        let lengths = [
            ("split_indices", schema.split_indices.len()),
            ("thresholds", schema.thresholds.len()),
            ("children_left", schema.children_left.len()),
            ("children_right", schema.children_right.len()),
            ("default_left", schema.default_left.len()),
            ("leaf_values", schema.leaf_values.len()),
        ];
        for (field, len) in lengths {
            if len != n_nodes {
                return Err(ReadError::Validation(format!(
                    "tree field {field} has {len} entries but num_nodes is {n_nodes}"
                )));
            }
        }

        // The root is never a child, so a zero pair marks a leaf.
        let is_leaf: Vec<bool> = schema
            .children_left
            .iter()
            .zip(schema.children_right.iter())
            .map(|(&l, &r)| l == 0 && r == 0)
            .collect();

        Ok(Tree::new(
            schema.split_indices,
            schema.thresholds,
            schema.children_left,
            schema.children_right,
            schema.default_left,
            is_leaf,
            schema.leaf_values,
        ))
    }
}

// =============================================================================
// Forest conversions
// =============================================================================

fn forest_from_schema(schema: ForestSchema, n_features: usize) -> Result<Forest, ReadError> {
    let mut forest = Forest::new(schema.aggregation.into())
        .with_base_score(schema.base_score)
        .with_decision_type(schema.decision_type.into());

    for tree in schema.trees {
        forest.push_tree(Tree::try_from(tree)?);
    }

    forest
        .validate(n_features)
        .map_err(|e| ReadError::Validation(e.to_string()))?;

    Ok(forest)
}

impl TryFrom<ForestModelSchema> for ForestModel {
    type Error = ReadError;

    fn try_from(schema: ForestModelSchema) -> Result<Self, Self::Error> {
        let meta = ModelMeta::try_from(schema.meta)?;
        let forest = forest_from_schema(schema.forest, meta.n_features())?;
        let transform = resolve_transform(schema.output_transform, meta.task);

        Ok(ForestModel::new(meta, forest, transform))
    }
}

// =============================================================================
// Linear conversions
// =============================================================================

impl TryFrom<LinearModelSchema> for LinearRegression {
    type Error = ReadError;

    fn try_from(schema: LinearModelSchema) -> Result<Self, Self::Error> {
        let meta = ModelMeta::try_from(schema.meta)?;

        let coefficients = schema.weights.coefficients;
        if coefficients.len() != meta.n_features() {
            return Err(ReadError::Validation(format!(
                "linear model has {} coefficients for {} features",
                coefficients.len(),
                meta.n_features()
            )));
        }

        let linear = LinearModel::new(Array1::from(coefficients), schema.weights.intercept);
        let transform = resolve_transform(schema.output_transform, meta.task);

        Ok(LinearRegression::new(meta, linear, transform))
    }
}
