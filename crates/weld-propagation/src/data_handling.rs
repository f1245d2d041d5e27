//! Data structures and helpers for criterion targets and resolved labels.
//!
//! This module defines `TargetFrame` (raw per-criterion measurements),
//! `LabelTable` (the ordered accumulator of resolved label columns), feature
//! matrix validation, and the seeded train/test split used to hold out fully
//! observed samples for accuracy evaluation.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, WeldError};

/// Prefix of the resolved label column derived from a criterion.
pub const PASSED_PREFIX: &str = "Passed ";

/// Name of the resolved label column for `criterion`.
pub fn passed_column_name(criterion: &str) -> String {
    format!("{}{}", PASSED_PREFIX, criterion)
}

/// Raw continuous measurements, one column per criterion. Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFrame {
    names: Vec<String>,
    columns: Vec<Array1<f64>>,
    n_rows: usize,
}

impl TargetFrame {
    /// Build a frame from named columns. Every column must have the same length
    /// and names must be unique.
    pub fn new(columns: Vec<(String, Array1<f64>)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != n_rows {
                return Err(WeldError::shape(
                    format!("target column '{}'", name),
                    n_rows,
                    column.len(),
                ));
            }
            if names.contains(&name) {
                return Err(WeldError::configuration(name, "duplicate target column"));
            }
            names.push(name);
            values.push(column);
        }

        Ok(TargetFrame {
            names,
            columns: values,
            n_rows,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Array1<f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    /// Columns in the order they were provided.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    pub fn nrows(&self) -> usize {
        self.n_rows
    }

    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    /// Rows where every criterion is observed.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.n_rows)
            .filter(|&row| self.columns.iter().all(|c| !c[row].is_nan()))
            .collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> TargetFrame {
        TargetFrame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c.select(Axis(0), indices))
                .collect(),
            n_rows: indices.len(),
        }
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Target Data Summary -----");
        for (name, column) in self.iter() {
            let missing = column.iter().filter(|v| v.is_nan()).count();
            log::info!(
                "{}: {} observed, {} missing",
                name,
                column.len() - missing,
                missing
            );
        }
        log::info!("-------------------------------");
    }
}

/// Ordered mapping from criterion name to its resolved 0/1 label column.
///
/// Filled one criterion at a time while fitting; the caller's `TargetFrame`
/// is never touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelTable {
    columns: Vec<(String, Array1<i32>)>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `labels` for `criterion`, overwriting a previous column in place.
    pub fn insert(&mut self, criterion: impl Into<String>, labels: Array1<i32>) -> Result<()> {
        let criterion = criterion.into();
        if let Some(n_rows) = self.nrows() {
            if labels.len() != n_rows {
                return Err(WeldError::shape(
                    format!("label column '{}'", criterion),
                    n_rows,
                    labels.len(),
                ));
            }
        }
        match self.columns.iter_mut().find(|(name, _)| *name == criterion) {
            Some((_, existing)) => *existing = labels,
            None => self.columns.push((criterion, labels)),
        }
        Ok(())
    }

    pub fn get(&self, criterion: &str) -> Option<&Array1<i32>> {
        self.columns
            .iter()
            .find(|(name, _)| name == criterion)
            .map(|(_, labels)| labels)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<i32>)> {
        self.columns.iter().map(|(name, labels)| (name.as_str(), labels))
    }

    pub fn criteria(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of samples, or `None` while the table is empty.
    pub fn nrows(&self) -> Option<usize> {
        self.columns.first().map(|(_, labels)| labels.len())
    }
}

/// Check that a feature matrix can be handed to the classifier: non-empty,
/// at least one feature, and every value finite.
pub fn validate_features(x: &Array2<f64>, stage: &str) -> Result<()> {
    if x.nrows() == 0 {
        return Err(WeldError::precondition(
            stage,
            "feature matrix invalid for propagation: no samples",
        ));
    }
    if x.ncols() == 0 {
        return Err(WeldError::precondition(
            stage,
            "feature matrix invalid for propagation: no feature columns",
        ));
    }
    if let Some(((row, col), value)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(WeldError::precondition(
            stage,
            format!(
                "feature matrix invalid for propagation: non-finite value {} at row {}, column {}",
                value, row, col
            ),
        ));
    }
    Ok(())
}

/// Features and targets split into a training part and a held-out part.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: TargetFrame,
    pub x_test: Array2<f64>,
    pub y_test: TargetFrame,
    /// Row indices (into the input) of the training samples, ascending.
    pub train_indices: Vec<usize>,
    /// Row indices (into the input) of the held-out samples, in draw order.
    pub test_indices: Vec<usize>,
}

/// Hold out `ratio` of the fully observed samples for evaluation.
///
/// Only rows whose every criterion is observed are eligible for the test set,
/// so accuracy is measured against real truth. All other rows, including the
/// ones with missing measurements, stay in the training set where label
/// propagation resolves them.
///
/// # Arguments
///
/// * `x` - Features, shape (n_samples, n_features)
/// * `y` - Targets with the same number of rows as `x`
/// * `ratio` - Fraction of the complete rows to hold out, in (0, 1)
/// * `seed` - Seed for the row sampler
pub fn train_test_split(
    x: &Array2<f64>,
    y: &TargetFrame,
    ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(WeldError::configuration(
            "test_ratio",
            format!("ratio must lie in (0, 1), got {}", ratio),
        ));
    }
    if x.nrows() != y.nrows() {
        return Err(WeldError::shape("target rows", x.nrows(), y.nrows()));
    }

    let complete = y.complete_rows();
    let n_test = (complete.len() as f64 * ratio).round() as usize;

    let mut rng = StdRng::seed_from_u64(seed);
    let test_indices: Vec<usize> = complete
        .choose_multiple(&mut rng, n_test)
        .cloned()
        .collect();

    let mut is_test = vec![false; x.nrows()];
    for &idx in &test_indices {
        is_test[idx] = true;
    }
    let train_indices: Vec<usize> = (0..x.nrows()).filter(|&i| !is_test[i]).collect();

    log::debug!(
        "Split {} samples into {} training and {} held-out ({} fully observed)",
        x.nrows(),
        train_indices.len(),
        test_indices.len(),
        complete.len()
    );

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        y_train: y.select_rows(&train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_test: y.select_rows(&test_indices),
        train_indices,
        test_indices,
    })
}
