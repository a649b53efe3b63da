//! Data
//!
//! Row-oriented tabular data consumed by the tree grower. Every column holds numeric
//! values, and the last column of each row is the label. Categorical columns are expected
//! to be mapped to numbers before they reach this module.
use crate::constants::N_FOLDS;
use crate::errors::ArborError;
use hashbrown::HashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// A single observation. All values but the last are features, the last one is the label.
///
/// Rows are immutable and cheap to clone, so datasets derived by partitioning or fold
/// construction share the underlying values with their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Arc<[f64]>);

impl Row {
    pub fn new(values: Vec<f64>) -> Self {
        Row(Arc::from(values))
    }

    /// All values, label included.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The feature vector, everything but the label.
    pub fn x(&self) -> &[f64] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    /// The label, `NaN` for a row with no values.
    pub fn y(&self) -> f64 {
        self.0.last().copied().unwrap_or(f64::NAN)
    }
}

impl From<Vec<f64>> for Row {
    fn from(values: Vec<f64>) -> Self {
        Row::new(values)
    }
}

impl<const N: usize> From<[f64; N]> for Row {
    fn from(values: [f64; N]) -> Self {
        Row(Arc::from(values.as_slice()))
    }
}

/// Map a label to a hashable key, folding `-0.0` onto `0.0`.
#[inline]
pub(crate) fn label_key(label: f64) -> u64 {
    if label == 0.0 {
        0.0_f64.to_bits()
    } else {
        label.to_bits()
    }
}

#[derive(Debug, PartialEq)]
struct Columns {
    names: Vec<String>,
    continuous: Vec<bool>,
}

/// Rows of data, where index `i` of every row holds a value of column `i`.
///
/// Continuous columns are split with `value > threshold`, all other columns
/// with `value == category`.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Arc<Columns>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a new dataset, checking that every row has one value per column.
    ///
    /// * `names` - Column names, the last one is the label.
    /// * `continuous` - One flag per column, `true` for continuous columns.
    /// * `rows` - The observations.
    pub fn new<S: Into<String>>(names: Vec<S>, continuous: Vec<bool>, rows: Vec<Row>) -> Result<Self, ArborError> {
        if names.is_empty() || names.len() != continuous.len() {
            return Err(ArborError::MissingColumns);
        }
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let expected = names.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(ArborError::ShapeMismatch {
                row,
                expected,
                found: r.len(),
            });
        }
        Ok(Dataset {
            columns: Arc::new(Columns { names, continuous }),
            rows,
        })
    }

    /// Create a dataset with the given columns and no rows.
    pub fn empty<S: Into<String>>(names: Vec<S>, continuous: Vec<bool>) -> Result<Self, ArborError> {
        Dataset::new(names, continuous, Vec::new())
    }

    /// A new dataset with the same columns as this one.
    fn with_rows(&self, rows: Vec<Row>) -> Dataset {
        Dataset {
            columns: Arc::clone(&self.columns),
            rows,
        }
    }

    /// Append a row, checking its width.
    pub fn insert_row(&mut self, row: Row) -> Result<(), ArborError> {
        if row.len() != self.n_columns() {
            return Err(ArborError::ShapeMismatch {
                row: self.rows.len(),
                expected: self.n_columns(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    pub fn column_is_continuous(&self) -> &[bool] {
        &self.columns.continuous
    }

    pub fn n_columns(&self) -> usize {
        self.columns.names.len()
    }

    /// Number of feature columns, all columns but the label.
    pub fn n_features(&self) -> usize {
        self.n_columns() - 1
    }

    pub fn label_is_continuous(&self) -> bool {
        self.columns.continuous[self.n_columns() - 1]
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ArborError> {
        self.columns
            .names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ArborError::ColumnNotFound(name.to_string()))
    }

    pub fn labels(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(Row::y)
    }

    /// Arithmetic mean of the labels, `0.0` when there are no rows.
    pub fn label_mean(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.labels().sum::<f64>() / self.size() as f64
    }

    /// Sum of squared residuals of the labels around their own mean.
    pub fn sum_squared_residuals(&self) -> f64 {
        let mean = self.label_mean();
        self.labels().map(|y| (y - mean) * (y - mean)).sum()
    }

    /// Gini impurity, the probability that two labels drawn at random from this
    /// dataset differ. `0.0` for a pure or empty dataset.
    pub fn gini_impurity(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for y in self.labels() {
            *counts.entry(label_key(y)).or_insert(0) += 1;
        }
        let n = self.size() as f64;
        1.0 - counts
            .values()
            .map(|&c| {
                let ratio = c as f64 / n;
                ratio * ratio
            })
            .sum::<f64>()
    }

    /// Partition the rows on the named column.
    ///
    /// A row goes to the true side when its value is `> on` for a continuous column,
    /// or `== on` otherwise. Everything else goes to the false side.
    pub fn partition_by_name(&self, column: &str, on: f64) -> Result<Partition, ArborError> {
        let idx = self.column_index(column)?;
        Ok(self.partition_by_index(idx, on))
    }

    /// `column` must be a valid column index.
    pub(crate) fn partition_by_index(&self, column: usize, on: f64) -> Partition {
        let rule = SplitRule {
            column_index: column,
            column_name: self.columns.names[column].clone(),
            value: on,
            is_continuous: self.columns.continuous[column],
        };
        let (true_rows, false_rows): (Vec<Row>, Vec<Row>) =
            self.rows.iter().cloned().partition(|r| rule.evaluate(r.values()));
        Partition {
            rule,
            false_set: self.with_rows(false_rows),
            true_set: self.with_rows(true_rows),
        }
    }

    /// The default ten train/test folds, see [`Dataset::cross_validation_folds_k`].
    pub fn cross_validation_folds(&self) -> Vec<Fold> {
        self.cross_validation_folds_k(N_FOLDS)
    }

    /// Split the rows into `k` contiguous test blocks of `size / k` rows each, every
    /// block paired with all remaining rows as training data. Rows past `k * (size / k)`
    /// never land in a test block.
    pub fn cross_validation_folds_k(&self, k: usize) -> Vec<Fold> {
        if k == 0 {
            return Vec::new();
        }
        let n_test = self.size() / k;
        (0..k)
            .map(|i| {
                let start = i * n_test;
                let stop = start + n_test;
                let train: Vec<Row> = self.rows[..start].iter().chain(&self.rows[stop..]).cloned().collect();
                Fold {
                    train: self.with_rows(train),
                    test: self.with_rows(self.rows[start..stop].to_vec()),
                }
            })
            .collect()
    }

    /// A copy of this dataset with its rows shuffled.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Dataset {
        let mut rows = self.rows.clone();
        rows.shuffle(rng);
        self.with_rows(rows)
    }

    /// Sample variance (`n - 1` denominator) of every column, label included.
    pub fn column_variances(&self) -> Result<Vec<f64>, ArborError> {
        if self.size() < 2 {
            return Err(ArborError::InsufficientRows {
                needed: 2,
                found: self.size(),
            });
        }
        let n = self.size() as f64;
        let variances = (0..self.n_columns())
            .map(|c| {
                let mean = self.rows.iter().map(|r| r.values()[c]).sum::<f64>() / n;
                self.rows
                    .iter()
                    .map(|r| {
                        let diff = r.values()[c] - mean;
                        diff * diff
                    })
                    .sum::<f64>()
                    / (n - 1.0)
            })
            .collect();
        Ok(variances)
    }
}

/// The test applied at an internal tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRule {
    pub column_index: usize,
    pub column_name: String,
    pub value: f64,
    pub is_continuous: bool,
}

impl SplitRule {
    /// Whether a row (or feature vector) goes to the true side of this rule.
    #[inline]
    pub fn evaluate(&self, values: &[f64]) -> bool {
        let v = values[self.column_index];
        if self.is_continuous {
            v > self.value
        } else {
            v == self.value
        }
    }
}

/// The result of splitting a dataset with a [`SplitRule`].
#[derive(Debug, Clone)]
pub struct Partition {
    pub rule: SplitRule,
    pub false_set: Dataset,
    pub true_set: Dataset,
}

impl Partition {
    /// A partition carries information only when both sides have rows.
    pub fn is_informative(&self) -> bool {
        !self.false_set.is_empty() && !self.true_set.is_empty()
    }
}

/// One train/test pair used during cross-validation.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Dataset,
    pub test: Dataset,
}
