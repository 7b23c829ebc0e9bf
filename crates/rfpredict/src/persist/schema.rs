//! Schema types for the native model document.
//!
//! These types provide a stable serialization format independent of runtime types.
//! Schema types are separate from runtime types for:
//! - Forward/backward compatibility (schema can evolve independently)
//! - Validation during deserialization
//! - Clear migration paths between schema versions
//!
//! A document is an envelope carrying the format version and model type,
//! with the model body stored under `model`:
//!
//! ```json
//! {"format_version": 1, "model_type": "forest", "model": {"meta": {..}, "forest": {..}}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format version written by this crate and the only one it reads.
pub const FORMAT_VERSION: u32 = 1;

/// Top-level envelope. The body is decoded once the version is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Schema version of the document.
    pub format_version: u32,
    /// Which body schema `model` follows.
    pub model_type: ModelTypeSchema,
    /// Model body (`ForestModelSchema` or `LinearModelSchema`).
    pub model: Value,
}

/// Model family stored in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTypeSchema {
    /// Tree ensemble.
    Forest,
    /// Linear model.
    Linear,
}

/// Task type for model output interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKindSchema {
    /// Regression task.
    #[default]
    Regression,
    /// Binary classification task.
    BinaryClassification,
}

/// Model metadata schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetaSchema {
    /// Task type.
    #[serde(default)]
    pub task: TaskKindSchema,
    /// Number of features.
    pub num_features: usize,
    /// Feature names (optional; defaults to `f0..f{n-1}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Objective name (for debugging/reproducibility). Not used for inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_name: Option<String>,
}

/// Tree schema (SoA layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSchema {
    /// Number of nodes (internal + leaves).
    pub num_nodes: u32,
    /// Split feature index for each node.
    pub split_indices: Vec<u32>,
    /// Split threshold for each node.
    pub thresholds: Vec<f64>,
    /// Left child index for each node (0 on leaves).
    pub children_left: Vec<u32>,
    /// Right child index for each node (0 on leaves).
    pub children_right: Vec<u32>,
    /// Default direction (true = left) for missing values.
    pub default_left: Vec<bool>,
    /// Value of each node; only read at leaves.
    pub leaf_values: Vec<f64>,
}

/// Aggregation of per-tree outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationSchema {
    #[default]
    Sum,
    Mean,
}

/// Comparison used at numeric splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTypeSchema {
    #[default]
    LessThan,
    LessOrEqual,
}

/// Forest schema (collection of trees).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSchema {
    /// Trees in iteration order.
    pub trees: Vec<TreeSchema>,
    #[serde(default)]
    pub aggregation: AggregationSchema,
    #[serde(default)]
    pub decision_type: DecisionTypeSchema,
    /// Value added to the aggregated tree output.
    #[serde(default)]
    pub base_score: f64,
}

/// Output transform schema for inference-time transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTransformSchema {
    /// No transformation (raw predictions).
    Identity,
    /// Sigmoid for binary classification.
    Sigmoid,
    /// Exponential for log-link objectives.
    Exp,
}

/// Linear weights schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWeightsSchema {
    /// One coefficient per feature.
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

/// Tree ensemble model body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModelSchema {
    pub meta: ModelMetaSchema,
    pub forest: ForestSchema,
    /// Output transform; defaults from `meta.task` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_transform: Option<OutputTransformSchema>,
}

impl ForestModelSchema {
    /// Model type string.
    pub const MODEL_TYPE: ModelTypeSchema = ModelTypeSchema::Forest;
}

/// Linear model body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelSchema {
    pub meta: ModelMetaSchema,
    pub weights: LinearWeightsSchema,
    /// Output transform; defaults from `meta.task` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_transform: Option<OutputTransformSchema>,
}

impl LinearModelSchema {
    /// Model type string.
    pub const MODEL_TYPE: ModelTypeSchema = ModelTypeSchema::Linear;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_kind_serde() {
        let task = TaskKindSchema::BinaryClassification;
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#""binary_classification""#);

        let parsed: TaskKindSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn model_meta_optional_fields() {
        let meta = ModelMetaSchema {
            task: TaskKindSchema::Regression,
            num_features: 10,
            feature_names: None,
            objective_name: None,
        };

        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("feature_names"));
        assert!(!json.contains("objective_name"));
    }

    #[test]
    fn forest_defaults_when_fields_absent() {
        let forest: ForestSchema = serde_json::from_value(json!({"trees": []})).unwrap();
        assert_eq!(forest.aggregation, AggregationSchema::Sum);
        assert_eq!(forest.decision_type, DecisionTypeSchema::LessThan);
        assert_eq!(forest.base_score, 0.0);
    }

    #[test]
    fn envelope_keeps_body_opaque() {
        let doc: ModelDocument = serde_json::from_value(json!({
            "format_version": 1,
            "model_type": "linear",
            "model": {"anything": true}
        }))
        .unwrap();

        assert_eq!(doc.model_type, LinearModelSchema::MODEL_TYPE);
        assert_eq!(doc.model["anything"], json!(true));
    }

    #[test]
    fn unknown_model_type_rejected() {
        let result: Result<ModelDocument, _> = serde_json::from_value(json!({
            "format_version": 1,
            "model_type": "neural_net",
            "model": {}
        }));
        assert!(result.is_err());
    }
}
