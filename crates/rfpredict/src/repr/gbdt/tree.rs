//! Canonical tree representation (SoA) and single-row traversal.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for efficient traversal
//! - [`DecisionType`]: Comparison used at numeric splits
//! - [`TreeValidationError`]: Structural validation errors

use super::NodeId;

// ============================================================================
// DecisionType
// ============================================================================

/// Comparison operator used at numeric split nodes.
///
/// Tree learners disagree on which side of the threshold a value equal to the
/// threshold goes to. XGBoost and LightGBM send it right (`x < t` goes left),
/// scikit-learn sends it left (`x <= t` goes left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionType {
    /// Go left iff `value < threshold`.
    #[default]
    LessThan,
    /// Go left iff `value <= threshold`.
    LessOrEqual,
}

impl DecisionType {
    /// Returns true if `value` should follow the left branch.
    #[inline]
    pub fn goes_left(self, value: f64, threshold: f64) -> bool {
        match self {
            DecisionType::LessThan => value < threshold,
            DecisionType::LessOrEqual => value <= threshold,
        }
    }
}

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// A child pointer references an out-of-bounds node.
    #[error("node {node} has {side} child {child} but tree has {n_nodes} nodes")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    #[error("node {node} references itself as a child")]
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage for efficient traversal.
///
/// Stores tree nodes in flat arrays for cache-friendly traversal.
/// Child indices are local to this tree (0 = root).
#[derive(Debug, Clone)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f64]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
}

impl Tree {
    /// Create a new tree from parallel arrays.
    ///
    /// All arrays must have the same length (number of nodes). Values of
    /// split fields at leaf nodes and leaf values at split nodes are ignored.
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f64>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Self {
        let n_nodes = split_indices.len();
        debug_assert_eq!(n_nodes, split_thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, default_left.len());
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, leaf_values.len());

        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
        }
    }

    /// Create a single-leaf tree that always predicts `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![false],
            vec![true],
            vec![value],
        )
    }

    // =========================================================================
    // Node accessors
    // =========================================================================

    /// Number of nodes in the tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f64 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Number of leaf nodes.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| leaf).count()
    }

    /// Largest feature index used by any split node, if the tree has splits.
    pub fn max_split_index(&self) -> Option<u32> {
        self.split_indices
            .iter()
            .zip(self.is_leaf.iter())
            .filter(|(_, &leaf)| !leaf)
            .map(|(&idx, _)| idx)
            .max()
    }

    /// Multiply every leaf value by `weight`.
    ///
    /// Used to bake per-tree DART weights into the leaves.
    pub fn scale_leaves(&mut self, weight: f64) {
        for v in self.leaf_values.iter_mut() {
            *v *= weight;
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants: every node is reachable from the root
    /// exactly once and child pointers are in bounds.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;

            match phase {
                0 => {
                    match color[node_usize] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node }),
                        _ => return Err(TreeValidationError::DuplicateVisit { node }),
                    }

                    color[node_usize] = 1;
                    stack.push((node, 1));

                    if !self.is_leaf(node) {
                        let left = self.left_child(node);
                        let right = self.right_child(node);

                        if left == node || right == node {
                            return Err(TreeValidationError::SelfLoop { node });
                        }
                        for (side, child) in [("left", left), ("right", right)] {
                            if child as usize >= n_nodes {
                                return Err(TreeValidationError::ChildOutOfBounds {
                                    node,
                                    side,
                                    child,
                                    n_nodes,
                                });
                            }
                        }

                        stack.push((right, 0));
                        stack.push((left, 0));
                    }
                }
                _ => {
                    color[node_usize] = 2;
                }
            }
        }

        if let Some(i) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: i as u32 });
        }

        Ok(())
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Traverse the tree to find the leaf node for a sample.
    ///
    /// NaN feature values follow the node's default direction.
    #[inline]
    pub fn traverse_to_leaf(&self, features: &[f32], decision: DecisionType) -> NodeId {
        let mut node: NodeId = 0;

        while !self.is_leaf(node) {
            let fvalue = features[self.split_index(node) as usize];

            let go_left = if fvalue.is_nan() {
                self.default_left(node)
            } else {
                decision.goes_left(fvalue as f64, self.split_threshold(node))
            };

            node = if go_left {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }

        node
    }

    /// Leaf value reached by a single row of features.
    pub fn predict_row(&self, features: &[f32], decision: DecisionType) -> f64 {
        self.leaf_value(self.traverse_to_leaf(features, decision))
    }
}
