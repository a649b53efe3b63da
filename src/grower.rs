//! Grower
//!
//! Greedy, exhaustive tree induction. Every node tries every (feature, row) pair as a
//! split candidate and keeps the best one, so the resulting tree fits its training data
//! as closely as the evaluator allows. Pruning is left to [`crate::prune`].
use crate::data::{Dataset, Partition};
use crate::errors::ArborError;
use crate::evaluator::Evaluator;
use crate::node::{DecisionNode, Split};
use log::trace;
use std::sync::Arc;

/// Grows decision trees for a given evaluator.
#[derive(Debug, Clone, Copy)]
pub struct Grower {
    evaluator: Evaluator,
    max_depth: Option<usize>,
}

impl Grower {
    pub fn new(evaluator: Evaluator) -> Self {
        Grower {
            evaluator,
            max_depth: None,
        }
    }

    /// Set the maximum depth of the tree.
    /// * `max_depth` - Nodes at this depth become leaves, the root is depth 0.
    ///   `None` grows without a depth limit.
    pub fn set_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// Grow a tree on `dataset`.
    ///
    /// A node becomes a leaf when it has fewer rows than the evaluator's minimum, when it
    /// sits at the maximum depth, or when the best partition leaves one side empty.
    /// Otherwise the best partition is installed and both sides are grown, the true
    /// (right) side first.
    pub fn grow(&self, dataset: &Dataset) -> Result<DecisionNode, ArborError> {
        self.grow_node(dataset.clone(), 0)
    }

    fn grow_node(&self, dataset: Dataset, depth: usize) -> Result<DecisionNode, ArborError> {
        if dataset.is_empty() {
            return Err(ArborError::EmptyDataset);
        }
        if dataset.size() < self.evaluator.min_samples_for_split() || self.max_depth.is_some_and(|d| depth >= d) {
            return Ok(DecisionNode::leaf(self.evaluator, dataset, depth));
        }

        let (partition, score) = match self.best_partition(&dataset)? {
            Some((p, s)) if p.is_informative() => (p, s),
            _ => return Ok(DecisionNode::leaf(self.evaluator, dataset, depth)),
        };
        trace!(
            "depth {}: split {} on {} (score {}, {} / {} rows)",
            depth,
            partition.rule.column_name,
            partition.rule.value,
            score,
            partition.false_set.size(),
            partition.true_set.size()
        );

        let Partition {
            rule,
            false_set,
            true_set,
        } = partition;
        let right = self.grow_node(true_set, depth + 1)?;
        let left = self.grow_node(false_set, depth + 1)?;
        Ok(DecisionNode::leaf(self.evaluator, dataset, depth).with_split(Split {
            rule,
            score,
            left: Arc::new(left),
            right: Arc::new(right),
        }))
    }

    /// Try every feature column, and within it every row's value as the threshold.
    /// Ties keep the first candidate in column-major, then row-major order.
    fn best_partition(&self, dataset: &Dataset) -> Result<Option<(Partition, f64)>, ArborError> {
        let mut best: Option<(Partition, f64)> = None;
        for c in 0..dataset.n_features() {
            for row in dataset.iter() {
                let partition = dataset.partition_by_index(c, row.values()[c]);
                let score = self.evaluator.evaluate_split(dataset, &partition)?;
                let better = match &best {
                    None => true,
                    Some((_, best_score)) => self.evaluator.is_better(score, *best_score),
                };
                if better {
                    best = Some((partition, score));
                }
            }
        }
        Ok(best)
    }
}

/// Grow a fully overfit tree: no limits beyond the evaluator's minimum split size.
pub fn build_overfit_tree(dataset: &Dataset, evaluator: Evaluator) -> Result<DecisionNode, ArborError> {
    Grower::new(evaluator).grow(dataset)
}
