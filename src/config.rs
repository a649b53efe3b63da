//! Tree Configuration
//!
//! Defines the configuration used to fit a pruned tree, with serde defaults for the
//! optional fields and JSON round-tripping.
use crate::constants::{DEFAULT_MIN_SAMPLES_FOR_SPLIT, N_FOLDS};
use crate::errors::ArborError;
use crate::evaluator::Evaluator;
use crate::utils::{items_to_strings, validate_min_parameter};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of tree to grow.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TreeKind {
    /// Categorical labels, Gini information gain.
    Classification,
    /// Continuous labels, sum of squared residuals.
    Regression,
}

impl FromStr for TreeKind {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Classification" => Ok(TreeKind::Classification),
            "Regression" => Ok(TreeKind::Regression),
            _ => Err(ArborError::ParseString(
                s.to_string(),
                "TreeKind".to_string(),
                items_to_strings(vec!["Classification", "Regression"]),
            )),
        }
    }
}

fn default_min_samples_for_split() -> usize {
    DEFAULT_MIN_SAMPLES_FOR_SPLIT
}
fn default_max_depth() -> Option<usize> {
    None
}
fn default_n_folds() -> usize {
    N_FOLDS
}
fn default_num_threads() -> Option<usize> {
    None
}
fn default_seed() -> Option<u64> {
    None
}

/// Configuration for [`crate::PrunedTree`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct TreeConfig {
    /// Classification or regression.
    pub kind: TreeKind,
    /// Nodes with fewer rows are always leaves.
    #[serde(default = "default_min_samples_for_split")]
    pub min_samples_for_split: usize,
    /// Depth at which nodes become leaves, `None` for no limit.
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<usize>,
    /// Number of cross-validation folds.
    #[serde(default = "default_n_folds")]
    pub n_folds: usize,
    /// Threads used to evaluate folds, `None` for the calling thread only.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
    /// Seed used to shuffle rows before cross-validation, `None` keeps the row order.
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
}

impl TreeConfig {
    pub fn new(kind: TreeKind) -> Self {
        TreeConfig {
            kind,
            min_samples_for_split: default_min_samples_for_split(),
            max_depth: default_max_depth(),
            n_folds: default_n_folds(),
            num_threads: default_num_threads(),
            seed: default_seed(),
        }
    }

    /// Set the minimum number of rows a node needs to be split.
    pub fn set_min_samples_for_split(mut self, min_samples_for_split: usize) -> Self {
        self.min_samples_for_split = min_samples_for_split;
        self
    }

    /// Set the maximum depth of the tree.
    pub fn set_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the number of cross-validation folds.
    pub fn set_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the number of threads used for cross-validation.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set the shuffling seed.
    pub fn set_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter against its valid range.
    pub fn validate(&self) -> Result<(), ArborError> {
        validate_min_parameter(self.min_samples_for_split, 1, "min_samples_for_split")?;
        validate_min_parameter(self.n_folds, 2, "n_folds")?;
        if let Some(num_threads) = self.num_threads {
            validate_min_parameter(num_threads, 1, "num_threads")?;
        }
        Ok(())
    }

    pub fn evaluator(&self) -> Evaluator {
        match self.kind {
            TreeKind::Classification => Evaluator::classification(self.min_samples_for_split),
            TreeKind::Regression => Evaluator::regression(self.min_samples_for_split),
        }
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ArborError> {
        let config: TreeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ArborError> {
        Ok(serde_json::to_string(self)?)
    }
}
