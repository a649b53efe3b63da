//! Pruned Tree
//!
//! Grows a tree on all rows, computes its pruning path, and keeps the subtree whose
//! alpha is selected by cross-validation.
use crate::config::TreeConfig;
use crate::cross_validation::CrossValidator;
use crate::data::Dataset;
use crate::errors::ArborError;
use crate::grower::Grower;
use crate::node::DecisionNode;
use crate::prune::PruningPath;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A decision tree pruned to the complexity chosen by cross-validation.
#[derive(Debug, Clone)]
pub struct PrunedTree {
    pub cfg: TreeConfig,
    path: PruningPath,
    selected: usize,
}

impl PrunedTree {
    /// Fit a pruned tree.
    ///
    /// * `dataset` - Training rows, the last column is the label.
    /// * `cfg` - Tree configuration, validated before anything is grown.
    pub fn fit(dataset: &Dataset, cfg: &TreeConfig) -> Result<Self, ArborError> {
        cfg.validate()?;
        let data = match cfg.seed {
            Some(seed) => dataset.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => dataset.clone(),
        };
        let evaluator = cfg.evaluator();

        let full_tree = Grower::new(evaluator).set_max_depth(cfg.max_depth).grow(&data)?;
        let path = full_tree.subtrees_and_alphas();
        info!(
            "grew tree on {} rows: {} leaves, depth {}, {} pruning levels",
            data.size(),
            full_tree.n_leaves(),
            full_tree.height(),
            path.len()
        );

        let selected = CrossValidator::new(evaluator)
            .set_n_folds(cfg.n_folds)
            .set_max_depth(cfg.max_depth)
            .set_num_threads(cfg.num_threads)
            .select_alpha_index(path.alphas(), &data)?;

        let tree = PrunedTree {
            cfg: cfg.clone(),
            path,
            selected,
        };
        info!(
            "selected pruning level {} (alpha {}): {} leaves",
            selected,
            tree.alpha(),
            tree.tree().n_leaves()
        );
        Ok(tree)
    }

    /// The selected subtree.
    pub fn tree(&self) -> &DecisionNode {
        &self.path.subtrees()[self.selected]
    }

    /// The unpruned tree grown on all rows.
    pub fn full_tree(&self) -> &DecisionNode {
        &self.path.subtrees()[0]
    }

    pub fn path(&self) -> &PruningPath {
        &self.path
    }

    /// Index of the selected subtree in [`PrunedTree::path`].
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Alpha at which the selected subtree becomes optimal.
    pub fn alpha(&self) -> f64 {
        self.path.alphas()[self.selected]
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, ArborError> {
        self.tree().predict(features)
    }

    pub fn predict_dataset(&self, data: &Dataset, parallel: bool) -> Result<Vec<f64>, ArborError> {
        self.tree().predict_dataset(data, parallel)
    }
}
