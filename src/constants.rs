/// Number of train/test folds used when selecting the pruning level.
pub const N_FOLDS: usize = 10;
pub const DEFAULT_MIN_SAMPLES_FOR_SPLIT: usize = 2;
