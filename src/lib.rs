// Modules
pub mod config;
pub mod constants;
pub mod cross_validation;
pub mod data;
pub mod errors;
pub mod evaluator;
pub mod grower;
pub mod model;
pub mod node;
pub mod prune;
pub mod utils;

// Individual classes, and functions
pub use config::{TreeConfig, TreeKind};
pub use cross_validation::{select_alpha_index, CrossValidator};
pub use data::{Dataset, Fold, Partition, Row, SplitRule};
pub use errors::ArborError;
pub use evaluator::Evaluator;
pub use grower::{build_overfit_tree, Grower};
pub use model::PrunedTree;
pub use node::{Branch, DecisionNode, Split};
pub use prune::{subtrees_and_alphas, PruningPath};
