//! Evaluator
//!
//! Split-quality strategies. The grower uses an [`Evaluator`] to score candidate
//! partitions and the pruner uses it to measure the error of a node.
use crate::data::{label_key, Dataset, Partition};
use crate::errors::ArborError;
use crate::node::DecisionNode;
use hashbrown::HashMap;

/// How splits are scored and what a node predicts.
///
/// Both variants carry the minimum number of rows a node needs before the grower will
/// try to split it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluator {
    /// Categorical labels. Splits are scored by Gini information gain (higher is better),
    /// nodes predict their most frequent label.
    Classification { min_samples_for_split: usize },
    /// Continuous labels. Splits are scored by the sum of squared residuals of both
    /// sides (lower is better), nodes predict their mean label.
    Regression { min_samples_for_split: usize },
}

impl Evaluator {
    pub fn classification(min_samples_for_split: usize) -> Self {
        Evaluator::Classification { min_samples_for_split }
    }

    pub fn regression(min_samples_for_split: usize) -> Self {
        Evaluator::Regression { min_samples_for_split }
    }

    /// Nodes with fewer rows than this are always leaves.
    pub fn min_samples_for_split(&self) -> usize {
        match self {
            Evaluator::Classification { min_samples_for_split } | Evaluator::Regression { min_samples_for_split } => {
                *min_samples_for_split
            }
        }
    }

    /// Whether split scores are maximized (information gain) or minimized (SSR).
    pub fn maximize(&self) -> bool {
        matches!(self, Evaluator::Classification { .. })
    }

    /// Score a candidate partition of `dataset`.
    ///
    /// Classification returns `gini(parent) - weighted_mean(gini(false), gini(true))` and
    /// fails with [`ArborError::InvalidTarget`] if the label column is continuous.
    /// Regression returns `ssr(false) + ssr(true)`.
    pub fn evaluate_split(&self, dataset: &Dataset, partition: &Partition) -> Result<f64, ArborError> {
        match self {
            Evaluator::Classification { .. } => {
                if dataset.label_is_continuous() {
                    return Err(ArborError::InvalidTarget);
                }
                let size = dataset.size() as f64;
                let false_weight = partition.false_set.size() as f64 / size;
                let true_weight = partition.true_set.size() as f64 / size;
                let avg_impurity = false_weight * partition.false_set.gini_impurity()
                    + true_weight * partition.true_set.gini_impurity();
                Ok(dataset.gini_impurity() - avg_impurity)
            }
            Evaluator::Regression { .. } => {
                Ok(partition.false_set.sum_squared_residuals() + partition.true_set.sum_squared_residuals())
            }
        }
    }

    /// Is `new_score` strictly better than `old_score`? A `NaN` score is never better.
    #[inline]
    pub fn is_better(&self, new_score: f64, old_score: f64) -> bool {
        if self.maximize() {
            new_score > old_score
        } else {
            new_score < old_score
        }
    }

    /// The value a node holding `data` predicts.
    ///
    /// For classification the most frequent label wins. On a tie the label that reached
    /// the winning count first, scanning rows in order, is kept.
    pub fn predict(&self, data: &Dataset) -> f64 {
        match self {
            Evaluator::Classification { .. } => {
                let mut counts: HashMap<u64, usize> = HashMap::new();
                let mut best_class = 0.0;
                let mut best_count = 0;
                for y in data.labels() {
                    let count = counts.entry(label_key(y)).or_insert(0);
                    *count += 1;
                    if *count > best_count {
                        best_class = y;
                        best_count = *count;
                    }
                }
                best_class
            }
            Evaluator::Regression { .. } => data.label_mean(),
        }
    }

    /// Error of `data` when it sits in a single leaf.
    ///
    /// Classification: misclassification rate. Regression: sum of squared residuals.
    pub fn leaf_error(&self, data: &Dataset) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let prediction = self.predict(data);
        let total: f64 = data.labels().map(|y| self.single_error(y, prediction)).sum();
        match self {
            Evaluator::Classification { .. } => total / data.size() as f64,
            Evaluator::Regression { .. } => total,
        }
    }

    /// Error of a node's training rows, with the node treated as a leaf.
    pub fn error_at_node(&self, node: &DecisionNode) -> f64 {
        self.leaf_error(node.train_data())
    }

    /// Contribution of a single prediction to an error total.
    #[inline]
    pub fn single_error(&self, actual: f64, predicted: f64) -> f64 {
        match self {
            Evaluator::Classification { .. } => {
                if actual == predicted {
                    0.0
                } else {
                    1.0
                }
            }
            Evaluator::Regression { .. } => (actual - predicted) * (actual - predicted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use std::error::Error;

    fn xy(rows: &[(f64, f64)], label_continuous: bool) -> Dataset {
        Dataset::new(
            vec!["x", "y"],
            vec![true, label_continuous],
            rows.iter().map(|&(x, y)| Row::from([x, y])).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_information_gain_perfect_split() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 0.0), (2.0, 0.0), (3.0, 1.0), (4.0, 1.0)], false);
        let e = Evaluator::classification(1);
        let p = ds.partition_by_name("x", 2.0)?;
        assert_eq!(e.evaluate_split(&ds, &p)?, 0.5);
        let p = ds.partition_by_name("x", 1.0)?;
        let gain = e.evaluate_split(&ds, &p)?;
        assert!(gain > 0.0 && gain < 0.5);
        // Nothing moves: no gain.
        let p = ds.partition_by_name("x", 4.0)?;
        assert_eq!(e.evaluate_split(&ds, &p)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_classification_rejects_continuous_label() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 0.5), (2.0, 1.5)], true);
        let p = ds.partition_by_name("x", 1.0)?;
        assert!(matches!(
            Evaluator::classification(1).evaluate_split(&ds, &p),
            Err(ArborError::InvalidTarget)
        ));
        // Regression is fine with it.
        assert!(Evaluator::regression(1).evaluate_split(&ds, &p).is_ok());
        Ok(())
    }

    #[test]
    fn test_regression_ssr() -> Result<(), Box<dyn Error>> {
        let ds = xy(&[(1.0, 1.0), (2.0, 3.0), (3.0, 10.0), (4.0, 12.0)], true);
        let e = Evaluator::regression(1);
        let p = ds.partition_by_name("x", 2.0)?;
        assert_eq!(e.evaluate_split(&ds, &p)?, 4.0);

        let flat = xy(&[(1.0, 7.0), (2.0, 7.0), (3.0, 7.0)], true);
        for x in [1.0, 2.0, 3.0] {
            let p = flat.partition_by_name("x", x)?;
            assert_eq!(e.evaluate_split(&flat, &p)?, 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_is_better_direction() {
        let c = Evaluator::classification(1);
        let r = Evaluator::regression(1);
        assert!(c.is_better(0.5, 0.1));
        assert!(!c.is_better(0.1, 0.5));
        assert!(!c.is_better(0.5, 0.5));
        assert!(r.is_better(0.1, 0.5));
        assert!(!r.is_better(0.5, 0.1));
        assert!(!r.is_better(0.5, 0.5));
        assert!(!r.is_better(f64::NAN, 0.5));
    }

    #[test]
    fn test_predict() {
        let ds = xy(&[(1.0, 2.0), (2.0, 1.0), (3.0, 1.0), (4.0, 6.0)], false);
        assert_eq!(Evaluator::classification(1).predict(&ds), 1.0);
        assert_eq!(Evaluator::regression(1).predict(&ds), 2.5);

        // 2 reaches a count of two before 1 does.
        let tie = xy(&[(1.0, 1.0), (2.0, 2.0), (3.0, 2.0), (4.0, 1.0)], false);
        assert_eq!(Evaluator::classification(1).predict(&tie), 2.0);
        let tie = xy(&[(1.0, 3.0), (2.0, 4.0)], false);
        assert_eq!(Evaluator::classification(1).predict(&tie), 3.0);
    }

    #[test]
    fn test_leaf_error_and_single_error() {
        let ds = xy(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 1.0)], false);
        assert_eq!(Evaluator::classification(1).leaf_error(&ds), 0.25);
        assert_eq!(Evaluator::regression(1).leaf_error(&ds), 0.75);
        assert_eq!(Evaluator::classification(1).single_error(1.0, 2.0), 1.0);
        assert_eq!(Evaluator::classification(1).single_error(2.0, 2.0), 0.0);
        assert_eq!(Evaluator::regression(1).single_error(1.0, 3.0), 4.0);
        assert_eq!(Evaluator::regression(1).leaf_error(&xy(&[], true)), 0.0);
    }
}
