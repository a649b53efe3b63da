//! Node
//!
//! Decision tree nodes, inference, and tree rendering.
use crate::data::{Dataset, SplitRule};
use crate::errors::ArborError;
use crate::evaluator::Evaluator;
use rayon::prelude::*;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Which child of an internal node to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Rows for which the split rule is false.
    Left,
    /// Rows for which the split rule is true.
    Right,
}

/// The split installed on an internal node.
///
/// Children are reference counted, so trees that differ in one collapsed node can share
/// every untouched subtree.
#[derive(Debug, Clone)]
pub struct Split {
    pub rule: SplitRule,
    /// Score of the winning partition, as returned by [`Evaluator::evaluate_split`].
    pub score: f64,
    pub left: Arc<DecisionNode>,
    pub right: Arc<DecisionNode>,
}

/// A node of a binary decision tree. A node without a split is a leaf.
#[derive(Debug, Clone)]
pub struct DecisionNode {
    evaluator: Evaluator,
    train_data: Dataset,
    depth: usize,
    value: f64,
    error: f64,
    split: Option<Split>,
}

impl DecisionNode {
    /// Create a leaf for `train_data`, computing its prediction and error once.
    pub(crate) fn leaf(evaluator: Evaluator, train_data: Dataset, depth: usize) -> Self {
        let value = evaluator.predict(&train_data);
        let error = evaluator.leaf_error(&train_data);
        DecisionNode {
            evaluator,
            train_data,
            depth,
            value,
            error,
            split: None,
        }
    }

    /// Install a split, making this node internal.
    pub(crate) fn with_split(mut self, split: Split) -> Self {
        self.split = Some(split);
        self
    }

    /// A copy of this node with its children removed.
    pub fn as_leaf(&self) -> Self {
        DecisionNode {
            evaluator: self.evaluator,
            train_data: self.train_data.clone(),
            depth: self.depth,
            value: self.value,
            error: self.error,
            split: None,
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// The training rows that reached this node.
    pub fn train_data(&self) -> &Dataset {
        &self.train_data
    }

    /// Distance from the root, the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// What this node predicts when treated as a leaf.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Error of this node's rows when it is treated as a leaf, see [`Evaluator::leaf_error`].
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn child(&self, branch: Branch) -> Option<&DecisionNode> {
        self.split.as_ref().map(|s| match branch {
            Branch::Left => s.left.as_ref(),
            Branch::Right => s.right.as_ref(),
        })
    }

    /// Number of features a feature vector must have.
    pub fn n_features(&self) -> usize {
        self.train_data.n_features()
    }

    /// Predict a single feature vector (a row without its label).
    pub fn predict(&self, features: &[f64]) -> Result<f64, ArborError> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(ArborError::ColumnCountMismatch {
                expected,
                found: features.len(),
            });
        }
        Ok(self.predict_unchecked(features))
    }

    fn predict_unchecked(&self, features: &[f64]) -> f64 {
        let mut node = self;
        while let Some(split) = &node.split {
            node = if split.rule.evaluate(features) {
                split.right.as_ref()
            } else {
                split.left.as_ref()
            };
        }
        node.value
    }

    /// Predict every row of `data`, ignoring its label column.
    pub fn predict_dataset(&self, data: &Dataset, parallel: bool) -> Result<Vec<f64>, ArborError> {
        if data.n_features() != self.n_features() {
            return Err(ArborError::ColumnCountMismatch {
                expected: self.n_features(),
                found: data.n_features(),
            });
        }
        let preds = if parallel {
            data.rows().par_iter().map(|r| self.predict_unchecked(r.x())).collect()
        } else {
            data.iter().map(|r| self.predict_unchecked(r.x())).collect()
        };
        Ok(preds)
    }

    /// Leaves under this node, left to right.
    pub fn leaves(&self) -> Vec<&DecisionNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match &node.split {
                None => out.push(node),
                Some(s) => {
                    stack.push(s.right.as_ref());
                    stack.push(s.left.as_ref());
                }
            }
        }
        out
    }

    pub fn n_leaves(&self) -> usize {
        match &self.split {
            None => 1,
            Some(s) => s.left.n_leaves() + s.right.n_leaves(),
        }
    }

    pub fn n_nodes(&self) -> usize {
        match &self.split {
            None => 1,
            Some(s) => 1 + s.left.n_nodes() + s.right.n_nodes(),
        }
    }

    /// Number of levels below this node.
    pub fn height(&self) -> usize {
        match &self.split {
            None => 0,
            Some(s) => 1 + s.left.height().max(s.right.height()),
        }
    }
}

impl Display for DecisionNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer = vec![(self, "root")];
        while let Some((node, name)) = print_buffer.pop() {
            let indent = "    ".repeat(node.depth - self.depth);
            match &node.split {
                None => writeln!(
                    f,
                    "{}{}: leaf={}, n={}, error={:.4}",
                    indent,
                    name,
                    node.value,
                    node.train_data.size(),
                    node.error
                )?,
                Some(s) => {
                    let op = if s.rule.is_continuous { ">" } else { "==" };
                    writeln!(
                        f,
                        "{}{}: [{} {} {}] score={:.4}, prediction={}, n={}, error={:.4}",
                        indent,
                        name,
                        s.rule.column_name,
                        op,
                        s.rule.value,
                        s.score,
                        node.value,
                        node.train_data.size(),
                        node.error
                    )?;
                    print_buffer.push((s.right.as_ref(), "R"));
                    print_buffer.push((s.left.as_ref(), "L"));
                }
            }
        }
        Ok(())
    }
}
