//! Portable predictor formats.
//!
//! Trained models are exported to JSON and evaluated here in pure Rust:
//!
//! - `linear`: one weight row per raw output plus intercepts
//! - `tree_ensemble`: flattened binary trees, summed (boosting) or averaged
//!   (random forest)
//! - `constant`: fixed output, for baselines and test doubles
//!
//! Every kind ends in a [`Link`] that maps raw outputs to the final output
//! vector (a score for regressors, class probabilities for classifiers).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evaluation failure for a single row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceFault {
    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("non-finite model output")]
    NonFinite,
}

/// Anything that maps an aligned feature vector to an output vector.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    /// Short kind name, reported by `GET /models`.
    fn kind(&self) -> &'static str;

    /// Input width the predictor was trained on.
    fn n_features(&self) -> usize;

    /// Width of the vector returned by [`Predictor::predict`].
    fn n_outputs(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceFault>;
}

/// Output link applied after the raw computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    #[default]
    Identity,
    /// Sigmoid. A single raw output expands to `[1 - p, p]`.
    Logistic,
    Softmax,
}

impl Link {
    /// Output width for `raw` raw outputs.
    pub fn output_width(self, raw: usize) -> usize {
        match self {
            Link::Logistic if raw == 1 => 2,
            _ => raw,
        }
    }

    pub fn apply(self, raw: Vec<f64>) -> Vec<f64> {
        match self {
            Link::Identity => raw,
            Link::Logistic if raw.len() == 1 => {
                let p = sigmoid(raw[0]);
                vec![1.0 - p, p]
            }
            Link::Logistic => raw.into_iter().map(sigmoid).collect(),
            Link::Softmax => {
                let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let exps: Vec<f64> = raw.iter().map(|v| (v - max).exp()).collect();
                let sum: f64 = exps.iter().sum();
                exps.into_iter().map(|e| e / sum).collect()
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn check_width(expected: usize, features: &[f64]) -> Result<(), InferenceFault> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(InferenceFault::Shape {
            expected,
            actual: features.len(),
        })
    }
}

fn finite(out: Vec<f64>) -> Result<Vec<f64>, InferenceFault> {
    if out.iter().all(|v| v.is_finite()) {
        Ok(out)
    } else {
        Err(InferenceFault::NonFinite)
    }
}

// ============================================================================
// Linear
// ============================================================================

/// Linear or logistic regression export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// `weights[k][j]`: weight of feature `j` for raw output `k`.
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub link: Link,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        let first = self.weights.first().ok_or("linear model has no weight rows")?;
        if first.is_empty() {
            return Err("linear model has zero features".to_string());
        }
        if self.weights.iter().any(|row| row.len() != first.len()) {
            return Err("weight rows differ in length".to_string());
        }
        if self.intercepts.len() != self.weights.len() {
            return Err(format!(
                "{} intercepts for {} weight rows",
                self.intercepts.len(),
                self.weights.len()
            ));
        }
        if self.weights.iter().flatten().chain(&self.intercepts).any(|v| !v.is_finite()) {
            return Err("non-finite coefficient".to_string());
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn n_outputs(&self) -> usize {
        self.link.output_width(self.weights.len())
    }

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceFault> {
        check_width(self.n_features(), features)?;
        let raw = self
            .weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| b + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>())
            .collect();
        finite(self.link.apply(raw))
    }
}

// ============================================================================
// Tree ensemble
// ============================================================================

/// One node of a flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Nodes in index order; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// How tree outputs are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
}

/// Split test applied at each node; a passing test goes left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `x <= threshold` (scikit-learn)
    #[default]
    LessOrEqual,
    /// `x < threshold` (XGBoost, LightGBM)
    Less,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleModel {
    pub n_features: usize,
    pub trees: Vec<Tree>,
    /// Added to the aggregate; one entry per raw output. Empty means zero.
    #[serde(default)]
    pub base_score: Vec<f64>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub split_rule: SplitRule,
    #[serde(default)]
    pub link: Link,
}

impl TreeEnsembleModel {
    fn raw_width(&self) -> usize {
        self.trees
            .first()
            .and_then(|t| {
                t.nodes.iter().find_map(|n| match n {
                    TreeNode::Leaf { value } => Some(value.len()),
                    TreeNode::Split { .. } => None,
                })
            })
            .unwrap_or(0)
    }

    /// Structural checks. Children must point forward, which rules out cycles
    /// and bounds every walk by the node count.
    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("tree ensemble has zero features".to_string());
        }
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        let width = self.raw_width();
        if width == 0 {
            return Err("tree ensemble has no leaf values".to_string());
        }
        if !self.base_score.is_empty() && self.base_score.len() != width {
            return Err(format!("base_score has {} entries, leaves have {width}", self.base_score.len()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} is empty"));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!("tree {t} node {i}: feature {feature} out of range"));
                        }
                        if threshold.is_nan() {
                            return Err(format!("tree {t} node {i}: NaN threshold"));
                        }
                        for child in [left, right] {
                            if *child <= i || *child >= tree.nodes.len() {
                                return Err(format!("tree {t} node {i}: bad child index {child}"));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != width {
                            return Err(format!("tree {t} node {i}: leaf width {} != {width}", value.len()));
                        }
                        if value.iter().any(|v| !v.is_finite()) {
                            return Err(format!("tree {t} node {i}: non-finite leaf value"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf<'a>(&self, tree: &'a Tree, features: &[f64]) -> &'a [f64] {
        let mut idx = 0;
        loop {
            match &tree.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features[*feature];
                    let go_left = match self.split_rule {
                        SplitRule::LessOrEqual => x <= *threshold,
                        SplitRule::Less => x < *threshold,
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }
}

impl Predictor for TreeEnsembleModel {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_outputs(&self) -> usize {
        self.link.output_width(self.raw_width())
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceFault> {
        check_width(self.n_features, features)?;
        let mut acc = vec![0.0; self.raw_width()];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(self.leaf(tree, features)) {
                *a += v;
            }
        }
        if self.aggregation == Aggregation::Mean {
            let n = self.trees.len() as f64;
            acc.iter_mut().for_each(|a| *a /= n);
        }
        for (a, b) in acc.iter_mut().zip(&self.base_score) {
            *a += b;
        }
        finite(self.link.apply(acc))
    }
}

// ============================================================================
// Constant
// ============================================================================

/// Ignores its input and returns `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantModel {
    pub n_features: usize,
    pub output: Vec<f64>,
}

impl Predictor for ConstantModel {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_outputs(&self) -> usize {
        self.output.len()
    }

    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceFault> {
        check_width(self.n_features, features)?;
        finite(self.output.clone())
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Predictor section of `model.json`, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorSpec {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsembleModel),
    Constant(ConstantModel),
}

impl PredictorSpec {
    /// Check internal consistency and hand out the evaluator.
    pub fn into_predictor(self) -> Result<Box<dyn Predictor>, String> {
        match self {
            PredictorSpec::Linear(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            PredictorSpec::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            PredictorSpec::Constant(m) => {
                if m.output.is_empty() {
                    return Err("constant model has no outputs".to_string());
                }
                Ok(Box::new(m))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_identity() {
        let m = LinearModel {
            weights: vec![vec![2.0, -1.0]],
            intercepts: vec![0.5],
            link: Link::Identity,
        };
        assert_eq!(m.predict(&[3.0, 1.0]).unwrap(), vec![5.5]);
        assert_eq!(m.n_outputs(), 1);
    }

    #[test]
    fn test_binary_logistic_expands_to_two_classes() {
        let m = LinearModel {
            weights: vec![vec![1.0]],
            intercepts: vec![0.0],
            link: Link::Logistic,
        };
        assert_eq!(m.n_outputs(), 2);
        let out = m.predict(&[0.0]).unwrap();
        assert!(approx(out[0], 0.5) && approx(out[1], 0.5));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let out = Link::Softmax.apply(vec![1.0, 2.0, 3.0]);
        assert!(approx(out.iter().sum(), 1.0));
        assert!(out[2] > out[1] && out[1] > out[0]);
        // Large logits must not overflow.
        let big = Link::Softmax.apply(vec![1000.0, 0.0]);
        assert!(approx(big[0], 1.0));
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let m = ConstantModel {
            n_features: 3,
            output: vec![42.0],
        };
        assert_eq!(
            m.predict(&[1.0]).unwrap_err(),
            InferenceFault::Shape {
                expected: 3,
                actual: 1
            }
        );
    }

    fn stump(threshold: f64, lo: f64, hi: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: vec![lo] },
                TreeNode::Leaf { value: vec![hi] },
            ],
        }
    }

    #[test]
    fn test_tree_sum_with_base_score() {
        let m = TreeEnsembleModel {
            n_features: 1,
            trees: vec![stump(10.0, 1.0, 5.0), stump(20.0, 0.0, 2.0)],
            base_score: vec![0.5],
            aggregation: Aggregation::Sum,
            split_rule: SplitRule::LessOrEqual,
            link: Link::Identity,
        };
        m.validate().unwrap();
        assert_eq!(m.predict(&[5.0]).unwrap(), vec![1.5]);
        assert_eq!(m.predict(&[10.0]).unwrap(), vec![1.5]);
        assert_eq!(m.predict(&[15.0]).unwrap(), vec![5.5]);
        assert_eq!(m.predict(&[25.0]).unwrap(), vec![7.5]);
    }

    #[test]
    fn test_split_rule_at_threshold() {
        let mut m = TreeEnsembleModel {
            n_features: 1,
            trees: vec![stump(10.0, 1.0, 5.0)],
            base_score: vec![],
            aggregation: Aggregation::Mean,
            split_rule: SplitRule::Less,
            link: Link::Identity,
        };
        assert_eq!(m.predict(&[10.0]).unwrap(), vec![5.0]);
        m.split_rule = SplitRule::LessOrEqual;
        assert_eq!(m.predict(&[10.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_forest_mean_of_class_votes() {
        let tree = |lo: Vec<f64>, hi: Vec<f64>| Tree {
            nodes: vec![
                TreeNode::Split {
                    feature: 1,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: lo },
                TreeNode::Leaf { value: hi },
            ],
        };
        let m = TreeEnsembleModel {
            n_features: 2,
            trees: vec![tree(vec![1.0, 0.0], vec![0.0, 1.0]), tree(vec![1.0, 0.0], vec![0.5, 0.5])],
            base_score: vec![],
            aggregation: Aggregation::Mean,
            split_rule: SplitRule::LessOrEqual,
            link: Link::Identity,
        };
        assert_eq!(m.n_outputs(), 2);
        assert_eq!(m.predict(&[0.0, 1.0]).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_backward_child_rejected() {
        let m = TreeEnsembleModel {
            n_features: 1,
            trees: vec![Tree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 1.0,
                        left: 0,
                        right: 1,
                    },
                    TreeNode::Leaf { value: vec![1.0] },
                ],
            }],
            base_score: vec![],
            aggregation: Aggregation::Sum,
            split_rule: SplitRule::LessOrEqual,
            link: Link::Identity,
        };
        assert!(m.validate().unwrap_err().contains("bad child index 0"));
    }

    #[test]
    fn test_spec_deserializes_by_kind() {
        let spec: PredictorSpec = serde_json::from_str(
            r#"{"kind": "tree_ensemble", "n_features": 1, "link": "logistic",
                "trees": [{"nodes": [
                    {"feature": 0, "threshold": 0.0, "left": 1, "right": 2},
                    {"value": [-2.0]},
                    {"value": [2.0]}
                ]}]}"#,
        )
        .unwrap();
        let p = spec.into_predictor().unwrap();
        assert_eq!(p.kind(), "tree_ensemble");
        assert_eq!(p.n_outputs(), 2);
        let out = p.predict(&[1.0]).unwrap();
        assert!(out[1] > 0.88);

        let bad: PredictorSpec =
            serde_json::from_str(r#"{"kind": "linear", "weights": [[1.0], [1.0, 2.0]], "intercepts": [0, 0]}"#).unwrap();
        assert!(bad.into_predictor().is_err());
    }
}
