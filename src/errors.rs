//! Errors
//!
//! Custom error types used throughout the `arbor` crate.
use thiserror::Error;

/// Errors that can occur while building, pruning or selecting a tree.
#[derive(Debug, Error)]
pub enum ArborError {
    /// A tree node cannot be created without rows.
    #[error("Cannot initialize a decision tree node without data.")]
    EmptyDataset,
    /// Classification needs a categorical label column.
    #[error("Target labels must not be continuous for classification.")]
    InvalidTarget,
    /// Partition requested on a column the dataset does not have.
    #[error("Could not find column with name {0}.")]
    ColumnNotFound(String),
    /// Prediction was given a feature vector of the wrong width.
    #[error("Could not predict, expected {expected} columns, had {found}.")]
    ColumnCountMismatch { expected: usize, found: usize },
    /// Cross-validated alpha is larger than every candidate alpha.
    #[error("Average alpha during cross validation ({0}) was greater than all eligible alphas.")]
    NoFeasibleAlpha(f64),
    /// A row does not have one value per column.
    #[error("Row {row} has {found} values, but the dataset has {expected} columns.")]
    ShapeMismatch { row: usize, expected: usize, found: usize },
    /// A dataset needs at least the label column.
    #[error("A dataset needs at least one column (the label), and one continuity flag per column.")]
    MissingColumns,
    /// Too few rows for the requested statistic.
    #[error("Need at least {needed} rows, found {found}.")]
    InsufficientRows { needed: usize, found: usize },
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// Unable to create the worker pool.
    #[error("Unable to build thread pool: {0}")]
    ThreadPool(String),
    /// Unable to read or write a configuration.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
