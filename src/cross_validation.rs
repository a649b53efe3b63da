//! Cross-validation
//!
//! Picks a pruning level with k-fold cross-validation. Each fold grows an overfit tree on
//! its training rows, prunes it, and keeps the alpha of the subtree with the lowest error
//! on the held-out rows. The fold alphas are averaged, and the first candidate alpha at
//! or above the average is selected.
use crate::constants::N_FOLDS;
use crate::data::{Dataset, Fold};
use crate::errors::ArborError;
use crate::evaluator::Evaluator;
use crate::grower::Grower;
use log::{debug, info};
use rayon::prelude::*;

/// Selects an alpha from a set of candidates by k-fold cross-validation.
#[derive(Debug, Clone, Copy)]
pub struct CrossValidator {
    evaluator: Evaluator,
    n_folds: usize,
    max_depth: Option<usize>,
    num_threads: Option<usize>,
}

impl CrossValidator {
    /// Ten folds, no depth limit, folds evaluated on the calling thread.
    pub fn new(evaluator: Evaluator) -> Self {
        CrossValidator {
            evaluator,
            n_folds: N_FOLDS,
            max_depth: None,
            num_threads: None,
        }
    }

    /// Set the number of folds.
    /// * `n_folds` - Number of contiguous test blocks, at least 2.
    pub fn set_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the maximum depth of the trees grown on each fold.
    pub fn set_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the number of threads.
    /// * `num_threads` - `None` evaluates folds one after the other on the calling thread,
    ///   `Some(n)` spreads them over a pool of `n` threads.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// The alpha chosen by each fold, in fold order.
    pub fn fold_alphas(&self, dataset: &Dataset) -> Result<Vec<f64>, ArborError> {
        if self.n_folds < 2 {
            return Err(ArborError::InvalidParameter(
                "n_folds".to_string(),
                "an integer of at least 2".to_string(),
                self.n_folds.to_string(),
            ));
        }
        let folds = dataset.cross_validation_folds_k(self.n_folds);
        let grower = Grower::new(self.evaluator).set_max_depth(self.max_depth);

        match self.num_threads {
            None => folds.iter().map(|fold| best_fold_alpha(&grower, fold)).collect(),
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| ArborError::ThreadPool(e.to_string()))?;
                pool.install(|| folds.par_iter().map(|fold| best_fold_alpha(&grower, fold)).collect())
            }
        }
    }

    /// Mean of the fold alphas.
    pub fn average_alpha(&self, dataset: &Dataset) -> Result<f64, ArborError> {
        let alphas = self.fold_alphas(dataset)?;
        for (i, a) in alphas.iter().enumerate() {
            debug!("fold {}: best alpha {}", i, a);
        }
        Ok(alphas.iter().sum::<f64>() / self.n_folds as f64)
    }

    /// Index of the first of `candidate_alphas` (sorted ascending) that is at least the
    /// cross-validated average alpha.
    pub fn select_alpha_index(&self, candidate_alphas: &[f64], dataset: &Dataset) -> Result<usize, ArborError> {
        let average = self.average_alpha(dataset)?;
        let idx = candidate_alphas
            .iter()
            .position(|&a| average <= a)
            .ok_or(ArborError::NoFeasibleAlpha(average))?;
        info!(
            "cross-validation over {} folds: average alpha {}, selected index {} (alpha {})",
            self.n_folds, average, idx, candidate_alphas[idx]
        );
        Ok(idx)
    }
}

/// Select a pruning level with the default ten folds.
///
/// * `candidate_alphas` - Alphas of the pruning path of a tree grown on all of `dataset`.
/// * `dataset` - The full training data.
/// * `evaluator` - The evaluator the tree was grown with.
pub fn select_alpha_index(
    candidate_alphas: &[f64],
    dataset: &Dataset,
    evaluator: Evaluator,
) -> Result<usize, ArborError> {
    CrossValidator::new(evaluator).select_alpha_index(candidate_alphas, dataset)
}

/// Grow and prune a tree on the fold's training rows, and return the alpha of the
/// subtree with the lowest summed error on the test rows. Ties keep the smaller alpha.
fn best_fold_alpha(grower: &Grower, fold: &Fold) -> Result<f64, ArborError> {
    let evaluator = grower.evaluator();
    let tree = grower.grow(&fold.train)?;
    let path = tree.subtrees_and_alphas();

    let mut lowest_err = f64::INFINITY;
    let mut lowest_alpha = f64::INFINITY;
    for (subtree, alpha) in path.iter() {
        let err = fold
            .test
            .iter()
            .map(|row| subtree.predict(row.x()).map(|p| evaluator.single_error(row.y(), p)))
            .sum::<Result<f64, ArborError>>()?;
        if err < lowest_err {
            lowest_err = err;
            lowest_alpha = alpha;
        }
    }
    Ok(lowest_alpha)
}
