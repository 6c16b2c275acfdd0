use crate::domain::ports::Classifier;
use crate::utils::error::ScoringError;
use serde::{Deserialize, Serialize};

/// One node of a flattened binary decision tree.
///
/// Children always sit after their parent in `nodes` (depth-first export order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Positive-class probability at this leaf.
    Leaf { probability: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {}, model has {}",
                            index, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", index));
                    }
                    for child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} points to invalid child {}",
                                index, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(format!(
                            "leaf {} has probability {} outside [0, 1]",
                            index, probability
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_probability(&self, features: &[f64]) -> Result<f64, ScoringError> {
        let mut index = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ScoringError::DimensionMismatch {
                            expected: *feature + 1,
                            actual: features.len(),
                        }
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ScoringError::InvalidOutput {
                        reason: format!("tree traversal reached missing node {}", index),
                    })
                }
            }
        }
        Err(ScoringError::InvalidOutput {
            reason: "tree traversal did not reach a leaf".to_string(),
        })
    }
}

/// Averaging ensemble of decision trees (random-forest style soft voting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn check(&self, n_features: usize) -> Result<(), String> {
        if self.n_features != n_features {
            return Err(format!(
                "ensemble declares {} features, expected {}",
                self.n_features, n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|reason| format!("tree {}: {}", i, reason))?;
        }
        Ok(())
    }

    fn positive_probability(&self, features: &[f64]) -> Result<f64, ScoringError> {
        if features.len() != self.n_features {
            return Err(ScoringError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.leaf_probability(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ScoringError> {
        let p = self.positive_probability(features)?;
        Ok(u8::from(p > 0.5))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        let p = self.positive_probability(features)?;
        Ok([1.0 - p, p])
    }
}
